//! Geographic lookup tables and projection fitting for map charts.

use crate::scale::Extent;

/// Continental US bounding box in degrees.
pub mod us_bounds {
    pub const TOP: f64 = 49.3457868;
    pub const LEFT: f64 = -124.7844079;
    pub const RIGHT: f64 = -66.9513812;
    pub const BOTTOM: f64 = 24.7433195;
}

/// Share of points that must fall inside the US box.
pub const US_INSIDE_FRACTION: f64 = 0.8;
/// Minimum longitude spread, as a fraction of the US box width.
pub const US_LON_SPAN_FRACTION: f64 = 0.2;
/// Minimum latitude spread, as a fraction of the US box height.
pub const US_LAT_SPAN_FRACTION: f64 = 0.1;

/// Web-mercator latitude limit.
pub const MERCATOR_MAX_LAT: f64 = 85.05113;
/// Share of the view the fitted points occupy.
const MERCATOR_PADDING: f64 = 0.9;

pub const US_TOPOLOGY_URL: &str = "https://cdn.jsdelivr.net/npm/vega-datasets@2.2.0/data/us-10m.json";
pub const WORLD_TOPOLOGY_URL: &str = "https://cdn.jsdelivr.net/npm/vega-datasets@2/data/world-110m.json";
/// Antarctica, dropped from world maps.
pub const ANTARCTICA_ID: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsState {
    pub fips: u8,
    pub abbr: &'static str,
    pub name: &'static str,
}

const fn state(fips: u8, abbr: &'static str, name: &'static str) -> UsState {
    UsState { fips, abbr, name }
}

/// The 50 states plus DC, keyed by the FIPS ids used in the us-10m topology.
pub const US_STATES: [UsState; 51] = [
    state(1, "AL", "Alabama"),
    state(2, "AK", "Alaska"),
    state(4, "AZ", "Arizona"),
    state(5, "AR", "Arkansas"),
    state(6, "CA", "California"),
    state(8, "CO", "Colorado"),
    state(9, "CT", "Connecticut"),
    state(10, "DE", "Delaware"),
    state(11, "DC", "District of Columbia"),
    state(12, "FL", "Florida"),
    state(13, "GA", "Georgia"),
    state(15, "HI", "Hawaii"),
    state(16, "ID", "Idaho"),
    state(17, "IL", "Illinois"),
    state(18, "IN", "Indiana"),
    state(19, "IA", "Iowa"),
    state(20, "KS", "Kansas"),
    state(21, "KY", "Kentucky"),
    state(22, "LA", "Louisiana"),
    state(23, "ME", "Maine"),
    state(24, "MD", "Maryland"),
    state(25, "MA", "Massachusetts"),
    state(26, "MI", "Michigan"),
    state(27, "MN", "Minnesota"),
    state(28, "MS", "Mississippi"),
    state(29, "MO", "Missouri"),
    state(30, "MT", "Montana"),
    state(31, "NE", "Nebraska"),
    state(32, "NV", "Nevada"),
    state(33, "NH", "New Hampshire"),
    state(34, "NJ", "New Jersey"),
    state(35, "NM", "New Mexico"),
    state(36, "NY", "New York"),
    state(37, "NC", "North Carolina"),
    state(38, "ND", "North Dakota"),
    state(39, "OH", "Ohio"),
    state(40, "OK", "Oklahoma"),
    state(41, "OR", "Oregon"),
    state(42, "PA", "Pennsylvania"),
    state(44, "RI", "Rhode Island"),
    state(45, "SC", "South Carolina"),
    state(46, "SD", "South Dakota"),
    state(47, "TN", "Tennessee"),
    state(48, "TX", "Texas"),
    state(49, "UT", "Utah"),
    state(50, "VT", "Vermont"),
    state(51, "VA", "Virginia"),
    state(53, "WA", "Washington"),
    state(54, "WV", "West Virginia"),
    state(55, "WI", "Wisconsin"),
    state(56, "WY", "Wyoming"),
];

/// Find a state by abbreviation or full name, ignoring case.
pub fn lookup_state(code: &str) -> Option<&'static UsState> {
    let code = code.trim();
    US_STATES
        .iter()
        .find(|s| s.abbr.eq_ignore_ascii_case(code) || s.name.eq_ignore_ascii_case(code))
}

/// Country names (and common aliases) to ISO 3166-1 numeric codes, the ids
/// of the world-110m topology.
const COUNTRY_CODES: &[(&str, u16)] = &[
    ("Afghanistan", 4),
    ("Albania", 8),
    ("Algeria", 12),
    ("Angola", 24),
    ("Argentina", 32),
    ("Australia", 36),
    ("Austria", 40),
    ("Bangladesh", 50),
    ("Belarus", 112),
    ("Belgium", 56),
    ("Bolivia", 68),
    ("Brazil", 76),
    ("Bulgaria", 100),
    ("Cambodia", 116),
    ("Cameroon", 120),
    ("Canada", 124),
    ("Chad", 148),
    ("Chile", 152),
    ("China", 156),
    ("Colombia", 170),
    ("Costa Rica", 188),
    ("Croatia", 191),
    ("Cuba", 192),
    ("Czechia", 203),
    ("Czech Republic", 203),
    ("Democratic Republic of the Congo", 180),
    ("Denmark", 208),
    ("Dominican Republic", 214),
    ("Ecuador", 218),
    ("Egypt", 818),
    ("El Salvador", 222),
    ("Estonia", 233),
    ("Ethiopia", 231),
    ("Finland", 246),
    ("France", 250),
    ("Germany", 276),
    ("Ghana", 288),
    ("Greece", 300),
    ("Greenland", 304),
    ("Guatemala", 320),
    ("Honduras", 340),
    ("Hungary", 348),
    ("Iceland", 352),
    ("India", 356),
    ("Indonesia", 360),
    ("Iran", 364),
    ("Iraq", 368),
    ("Ireland", 372),
    ("Israel", 376),
    ("Italy", 380),
    ("Jamaica", 388),
    ("Japan", 392),
    ("Jordan", 400),
    ("Kazakhstan", 398),
    ("Kenya", 404),
    ("Kuwait", 414),
    ("Latvia", 428),
    ("Libya", 434),
    ("Lithuania", 440),
    ("Luxembourg", 442),
    ("Madagascar", 450),
    ("Malaysia", 458),
    ("Mali", 466),
    ("Mexico", 484),
    ("Mongolia", 496),
    ("Morocco", 504),
    ("Mozambique", 508),
    ("Myanmar", 104),
    ("Nepal", 524),
    ("Netherlands", 528),
    ("New Zealand", 554),
    ("Nicaragua", 558),
    ("Niger", 562),
    ("Nigeria", 566),
    ("North Korea", 408),
    ("Norway", 578),
    ("Oman", 512),
    ("Pakistan", 586),
    ("Panama", 591),
    ("Paraguay", 600),
    ("Peru", 604),
    ("Philippines", 608),
    ("Poland", 616),
    ("Portugal", 620),
    ("Qatar", 634),
    ("Romania", 642),
    ("Russia", 643),
    ("Russian Federation", 643),
    ("Saudi Arabia", 682),
    ("Serbia", 688),
    ("Singapore", 702),
    ("Slovakia", 703),
    ("South Africa", 710),
    ("South Korea", 410),
    ("Korea, Republic of", 410),
    ("Spain", 724),
    ("Sri Lanka", 144),
    ("Sudan", 729),
    ("Sweden", 752),
    ("Switzerland", 756),
    ("Syria", 760),
    ("Taiwan", 158),
    ("Tanzania", 834),
    ("Thailand", 764),
    ("Tunisia", 788),
    ("Turkey", 792),
    ("Türkiye", 792),
    ("Uganda", 800),
    ("Ukraine", 804),
    ("United Arab Emirates", 784),
    ("United Kingdom", 826),
    ("UK", 826),
    ("Great Britain", 826),
    ("United States", 840),
    ("United States of America", 840),
    ("USA", 840),
    ("Uruguay", 858),
    ("Venezuela", 862),
    ("Vietnam", 704),
    ("Viet Nam", 704),
    ("Yemen", 887),
    ("Zambia", 894),
    ("Zimbabwe", 716),
];

/// ISO numeric code for a country name, ignoring case.
pub fn lookup_country_code(name: &str) -> Option<u16> {
    let name = name.trim();
    COUNTRY_CODES
        .iter()
        .find(|(n, _)| n.to_lowercase() == name.to_lowercase())
        .map(|(_, code)| *code)
}

fn inside_us(lon: f64, lat: f64) -> bool {
    (us_bounds::BOTTOM..=us_bounds::TOP).contains(&lat)
        && (us_bounds::LEFT..=us_bounds::RIGHT).contains(&lon)
}

/// Share of `(lon, lat)` points inside the continental US box.
pub fn fraction_inside_us(points: &[(f64, f64)]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let inside = points.iter().filter(|(lon, lat)| inside_us(*lon, *lat)).count();
    inside as f64 / points.len() as f64
}

/// True when the points look like a nationwide US dataset: mostly inside the
/// box and spread across a meaningful part of it. A cluster around one city
/// fails the spread test and gets a fitted mercator view instead.
pub fn is_nationwide_us(points: &[(f64, f64)]) -> bool {
    if fraction_inside_us(points) <= US_INSIDE_FRACTION {
        return false;
    }
    let (Some(lons), Some(lats)) = (
        Extent::of(points.iter().map(|p| p.0)),
        Extent::of(points.iter().map(|p| p.1)),
    ) else {
        return false;
    };
    let us_lon_span = us_bounds::RIGHT - us_bounds::LEFT;
    let us_lat_span = us_bounds::TOP - us_bounds::BOTTOM;
    lons.span() > us_lon_span * US_LON_SPAN_FRACTION && lats.span() > us_lat_span * US_LAT_SPAN_FRACTION
}

/// Mercator scale factor and center that frame a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorFit {
    /// Multiplier on `min(width, height)`.
    pub scale_factor: f64,
    /// `[lon, lat]` in degrees.
    pub center: [f64; 2],
}

fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    let x = lon.to_radians();
    let y = (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

/// `None` for an empty point set.
pub fn mercator_fit(points: &[(f64, f64)]) -> Option<MercatorFit> {
    let projected: Vec<(f64, f64)> = points.iter().map(|(lon, lat)| mercator(*lon, *lat)).collect();
    let xs = Extent::of(projected.iter().map(|p| p.0))?;
    let ys = Extent::of(projected.iter().map(|p| p.1))?;
    let lons = Extent::of(points.iter().map(|p| p.0))?;
    let lats = Extent::of(points.iter().map(|p| p.1))?;

    let spread = xs.span().max(ys.span());
    // A single location has no spread; frame it at whole-world scale.
    let scale_factor = if spread > 0.0 {
        MERCATOR_PADDING / spread
    } else {
        MERCATOR_PADDING / (2.0 * std::f64::consts::PI)
    };

    Some(MercatorFit {
        scale_factor,
        center: [lons.center(), lats.center()],
    })
}
