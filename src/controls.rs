//! Working chart configuration for one chart instance.
//!
//! The controller owns the config the user is editing, applies partial
//! updates to it, and walks the fallback chain when the schema changes under
//! it. Every change is reported through the registered callback.

use crate::data::Dataset;
use crate::ir::{Channel, ChartConfig, SelectionState};
use crate::resolve::{determine_default_config, validate_config_fields};
use crate::schema::Schema;
use tracing::debug;

pub type ConfigCallback = Box<dyn Fn(&ChartConfig) + Send + Sync>;

#[derive(Default)]
pub struct ConfigController {
    config: ChartConfig,
    initial: Option<ChartConfig>,
    selection: SelectionState,
    on_change: Option<ConfigCallback>,
}

impl ConfigController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(mut self, callback: impl Fn(&ChartConfig) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: SelectionState) {
        self.selection = selection;
        self.selection.retain_bound(&self.config);
    }

    fn notify(&self) {
        if let Some(callback) = &self.on_change {
            callback(&self.config);
        }
    }

    /// Adopt `initial` when given, otherwise the inferred defaults.
    pub fn initialize_config(&mut self, initial: Option<ChartConfig>, data: &Dataset, schema: &Schema) {
        self.initial = initial;
        self.load(false, data, schema);
    }

    fn load(&mut self, force_defaults: bool, data: &Dataset, schema: &Schema) {
        match self.initial.as_ref().filter(|_| !force_defaults) {
            Some(initial) => self.config.overlay(initial),
            None => {
                let kind = if force_defaults { self.config.chart_type } else { None };
                let defaults = determine_default_config(data, schema, kind);
                self.replace_bindings(&defaults);
            }
        }
        self.notify();
    }

    /// Swap every field binding for those in `defaults`. Display flags and
    /// scales survive.
    fn replace_bindings(&mut self, defaults: &ChartConfig) {
        for channel in Channel::ALL {
            *self.config.field_mut(channel) = None;
        }
        self.config.overlay(defaults);
    }

    /// Merge `partial` into the working config.
    ///
    /// Changing the chart kind recomputes that kind's default bindings before
    /// the fields named in `partial` are reapplied.
    pub fn update_config(&mut self, partial: &ChartConfig, data: &Dataset, schema: &Schema) {
        match partial.chart_type.filter(|k| Some(*k) != self.config.chart_type) {
            Some(kind) => {
                debug!(chart_type = %kind, "chart kind changed, recomputing bindings");
                let defaults = determine_default_config(data, schema, Some(kind));
                self.replace_bindings(&defaults);
                self.config.chart_type = Some(kind);
                self.config.overlay(partial);
            }
            None => self.config.overlay(partial),
        }
        self.selection.retain_bound(&self.config);
        self.notify();
    }

    /// Clear one binding.
    pub fn clear_field(&mut self, channel: Channel) {
        *self.config.field_mut(channel) = None;
        self.selection.retain_bound(&self.config);
        self.notify();
    }

    /// Check the working config against `schema`, falling back to the initial
    /// config, then to the inferred defaults, then to the defaults for the
    /// current kind. Returns false whenever a fallback was needed.
    pub fn validate_and_reset_config(&mut self, data: &Dataset, schema: &Schema) -> bool {
        if validate_config_fields(&mut self.config, schema) {
            return true;
        }

        debug!("working config references missing columns, falling back");
        self.load(false, data, schema);
        if !validate_config_fields(&mut self.config, schema) {
            self.load(true, data, schema);
        }
        self.selection.retain_bound(&self.config);
        false
    }
}
