use serde_json::{json, Value};

/// Closed numeric range observed in a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Extent of the finite values in `values`; `None` when there are none.
    pub fn of<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Extent>, v| match acc {
                None => Some(Extent::new(v, v)),
                Some(e) => Some(Extent::new(e.min.min(v), e.max.max(v))),
            })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }

    pub fn union(self, other: Extent) -> Extent {
        Extent::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// `[min, max]` as a scale domain.
    pub fn as_domain(&self) -> Value {
        json!([self.min, self.max])
    }
}

/// Union of several extents, skipping missing ones.
pub fn merge_extents<'a, I>(extents: I) -> Option<Extent>
where
    I: IntoIterator<Item = &'a Option<Extent>>,
{
    extents
        .into_iter()
        .flatten()
        .copied()
        .reduce(Extent::union)
}
