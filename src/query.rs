use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use std::str::FromStr;

/// Which side of a temporal interval a bare date sits on.
///
/// A date used as the start of an interval expands to the first second of
/// that day, a date used as the end expands to the last second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Begin,
    End,
}

/// A point in time accepted by the WOUDC temporal filter: either a calendar
/// date or a full date-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instant {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Instant {
    /// Renders the instant as the RFC 3339 string the service expects.
    pub fn to_query_string(&self, bound: Bound) -> String {
        match self {
            Instant::Date(d) => {
                let time = match bound {
                    Bound::Begin => "00:00:00",
                    Bound::End => "23:59:59",
                };
                format!("{}T{}Z", d.format("%Y-%m-%d"), time)
            }
            Instant::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

impl From<NaiveDate> for Instant {
    fn from(d: NaiveDate) -> Self {
        Instant::Date(d)
    }
}

impl From<NaiveDateTime> for Instant {
    fn from(dt: NaiveDateTime) -> Self {
        Instant::DateTime(dt)
    }
}

impl FromStr for Instant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Instant::Date(d));
        }
        for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Instant::DateTime(dt));
            }
        }
        bail!("invalid date/datetime {s:?} (expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")
    }
}

/// A temporal filter with at least one closed side.
///
/// Open sides are rendered as `..`, the OGC API convention for half-open
/// intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    start: Option<Instant>,
    end: Option<Instant>,
}

impl TimeInterval {
    pub fn new(start: Option<Instant>, end: Option<Instant>) -> Result<Self> {
        if start.is_none() && end.is_none() {
            bail!("temporal filter requires a start and/or an end");
        }
        Ok(Self { start, end })
    }

    pub fn since(start: impl Into<Instant>) -> Self {
        Self {
            start: Some(start.into()),
            end: None,
        }
    }

    pub fn until(end: impl Into<Instant>) -> Self {
        Self {
            start: None,
            end: Some(end.into()),
        }
    }

    pub fn between(start: impl Into<Instant>, end: impl Into<Instant>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    pub(crate) fn to_query_string(&self) -> String {
        let start = self
            .start
            .map(|i| i.to_query_string(Bound::Begin))
            .unwrap_or_else(|| "..".to_string());
        let end = self
            .end
            .map(|i| i.to_query_string(Bound::End))
            .unwrap_or_else(|| "..".to_string());
        format!("{start}/{end}")
    }
}

/// A spatial filter: `minx, miny, maxx, maxy` in decimal degrees (WGS 84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl BoundingBox {
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    pub(crate) fn to_query_string(&self) -> String {
        format!("{},{},{},{}", self.minx, self.miny, self.maxx, self.maxy)
    }
}

impl FromStr for BoundingBox {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            bail!("bbox must be minx,miny,maxx,maxy");
        }
        let mut coords = [0f64; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid bbox coordinate {part:?}"))?;
        }
        Ok(Self::new(coords[0], coords[1], coords[2], coords[3]))
    }
}

/// Sort order for `sortby`. The service default is ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => bail!("sort order must be asc or desc, got {other:?}"),
        }
    }
}

/// Filter constraints for a collection-items query.
///
/// Built once, passed by reference; each setter consumes and returns the
/// query so filters chain:
///
/// ```
/// use woudc::{BoundingBox, DataQuery};
///
/// let query = DataQuery::new()
///     .with_bbox(BoundingBox::new(-142.0, 42.0, -52.0, 84.0))
///     .with_property("platform_id", "077");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DataQuery {
    bbox: Option<BoundingBox>,
    interval: Option<TimeInterval>,
    properties: Vec<(String, String)>,
    sortby: Option<(String, SortOrder)>,
}

impl DataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_interval(mut self, interval: TimeInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Adds a property equality filter, passed through verbatim as a
    /// `name=value` query parameter.
    pub fn with_property(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.properties.push((name.into(), value.to_string()));
        self
    }

    /// Sorts results server-side by `property`.
    pub fn with_sortby(mut self, property: impl Into<String>, order: SortOrder) -> Self {
        self.sortby = Some((property.into(), order));
        self
    }

    /// Translates the filters into the query parameters the service expects.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("f".to_string(), "json".to_string())];

        if let Some(bbox) = &self.bbox {
            pairs.push(("bbox".to_string(), bbox.to_query_string()));
        }
        if let Some(interval) = &self.interval {
            pairs.push(("datetime".to_string(), interval.to_query_string()));
        }
        for (name, value) in &self.properties {
            pairs.push((name.clone(), value.clone()));
        }
        if let Some((property, order)) = &self.sortby {
            let prefix = match order {
                SortOrder::Asc => "+",
                SortOrder::Desc => "-",
            };
            pairs.push(("sortby".to_string(), format!("{prefix}{property}")));
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, s).unwrap()
    }

    #[test]
    fn date_expands_to_day_bounds() {
        let begin = Instant::from(date(2000, 11, 30));
        assert_eq!(begin.to_query_string(Bound::Begin), "2000-11-30T00:00:00Z");

        let end = Instant::from(date(2011, 11, 30));
        assert_eq!(end.to_query_string(Bound::End), "2011-11-30T23:59:59Z");
    }

    #[test]
    fn datetime_renders_verbatim() {
        let dt = Instant::from(datetime(2002, 10, 30, 11, 11, 11));
        assert_eq!(dt.to_query_string(Bound::Begin), "2002-10-30T11:11:11Z");
        assert_eq!(dt.to_query_string(Bound::End), "2002-10-30T11:11:11Z");
    }

    #[test]
    fn instant_parses_date_and_datetime() {
        assert_eq!(
            "2012-10-30".parse::<Instant>().unwrap(),
            Instant::Date(date(2012, 10, 30))
        );
        assert_eq!(
            "2012-10-30 11:11:11".parse::<Instant>().unwrap(),
            Instant::DateTime(datetime(2012, 10, 30, 11, 11, 11))
        );
        assert_eq!(
            "2012-10-30T11:11:11".parse::<Instant>().unwrap(),
            Instant::DateTime(datetime(2012, 10, 30, 11, 11, 11))
        );
    }

    #[test]
    fn instant_rejects_garbage() {
        assert!("yesterday".parse::<Instant>().is_err());
        assert!("2012-13-45".parse::<Instant>().is_err());
        assert!("".parse::<Instant>().is_err());
    }

    #[test]
    fn interval_requires_a_closed_side() {
        assert!(TimeInterval::new(None, None).is_err());

        let open_end = TimeInterval::since(date(2024, 11, 11));
        assert_eq!(open_end.to_query_string(), "2024-11-11T00:00:00Z/..");

        let open_start = TimeInterval::until(date(2024, 11, 11));
        assert_eq!(open_start.to_query_string(), "../2024-11-11T23:59:59Z");
    }

    #[test]
    fn interval_between_dates() {
        let interval = TimeInterval::between(date(2000, 1, 1), date(2000, 12, 31));
        assert_eq!(
            interval.to_query_string(),
            "2000-01-01T00:00:00Z/2000-12-31T23:59:59Z"
        );
    }

    #[test]
    fn bbox_parses_four_coordinates() {
        let bbox: BoundingBox = "-142, 42, -52, 84".parse().unwrap();
        assert_eq!(bbox.to_query_string(), "-142,42,-52,84");
    }

    #[test]
    fn bbox_rejects_wrong_arity_and_garbage() {
        assert!("42,-52,84".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
        assert!("1,2,3,4,5".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn sort_order_tokens() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("bad".parse::<SortOrder>().is_err());
    }

    #[test]
    fn query_pairs_use_service_parameter_names() {
        let query = DataQuery::new()
            .with_bbox(BoundingBox::new(-142.0, 42.0, -52.0, 84.0))
            .with_interval(TimeInterval::between(date(2024, 1, 1), date(2024, 1, 31)))
            .with_property("platform_id", "077")
            .with_sortby("observation_date", SortOrder::Desc);

        let pairs = query.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("f".to_string(), "json".to_string()),
                ("bbox".to_string(), "-142,42,-52,84".to_string()),
                (
                    "datetime".to_string(),
                    "2024-01-01T00:00:00Z/2024-01-31T23:59:59Z".to_string()
                ),
                ("platform_id".to_string(), "077".to_string()),
                ("sortby".to_string(), "-observation_date".to_string()),
            ]
        );
    }

    #[test]
    fn empty_query_only_requests_json() {
        assert_eq!(
            DataQuery::new().to_query_pairs(),
            vec![("f".to_string(), "json".to_string())]
        );
    }
}
