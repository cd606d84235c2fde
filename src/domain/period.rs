// Reporting period domain model - Indian fiscal year, quarters and months
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const ALL_MONTHS: [&str; 12] = [
    "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12",
];

/// April–March financial year, displayed as "2024-25"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FinancialYear {
    start_year: i32,
}

impl FinancialYear {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= 4 {
            Self::new(date.year())
        } else {
            Self::new(date.year() - 1)
        }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// First day of the year (1 April)
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year, 4, 1)
    }

    /// First day after the year (1 April of the following calendar year)
    pub fn end_date_exclusive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year + 1, 4, 1)
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, (self.start_year + 1).rem_euclid(100))
    }
}

impl FromStr for FinancialYear {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("financial year '{}' is not of the form YYYY-YY", s))?;

        if start.len() != 4 || end.len() != 2 {
            return Err(format!("financial year '{}' is not of the form YYYY-YY", s));
        }

        let start_year: i32 = start
            .parse()
            .map_err(|_| format!("financial year '{}' has a non-numeric start", s))?;
        let end_suffix: i32 = end
            .parse()
            .map_err(|_| format!("financial year '{}' has a non-numeric end", s))?;

        if (start_year + 1).rem_euclid(100) != end_suffix {
            return Err(format!("financial year '{}' does not span consecutive years", s));
        }

        Ok(Self::new(start_year))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }

    /// Fiscal quarter months: Q1=Apr–Jun, Q2=Jul–Sep, Q3=Oct–Dec, Q4=Jan–Mar
    pub fn months(&self) -> [&'static str; 3] {
        match self {
            Quarter::Q1 => ["04", "05", "06"],
            Quarter::Q2 => ["07", "08", "09"],
            Quarter::Q3 => ["10", "11", "12"],
            Quarter::Q4 => ["01", "02", "03"],
        }
    }

    pub fn containing(date: NaiveDate) -> Self {
        match date.month() {
            4..=6 => Quarter::Q1,
            7..=9 => Quarter::Q2,
            10..=12 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }
}

impl FromStr for Quarter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quarter::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| format!("unknown quarter '{}'", s))
    }
}

pub fn month_label(date: NaiveDate) -> String {
    format!("{:02}", date.month())
}

/// A change the user makes to the period selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodAction {
    SetFinancialYears(BTreeSet<String>),
    SetQuarters(BTreeSet<String>),
    SetMonths(BTreeSet<String>),
}

/// Selected reporting period.
///
/// Quarters and months only carry meaning relative to a single financial year,
/// so they are cleared whenever the year selection is not exactly one year.
/// Values are kept verbatim: anything unrecognised stays in the filter and
/// simply matches no project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFilter {
    financial_years: BTreeSet<String>,
    quarters: BTreeSet<String>,
    months: BTreeSet<String>,
}

impl PeriodFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn financial_years(&self) -> &BTreeSet<String> {
        &self.financial_years
    }

    pub fn quarters(&self) -> &BTreeSet<String> {
        &self.quarters
    }

    pub fn months(&self) -> &BTreeSet<String> {
        &self.months
    }

    pub fn has_single_year(&self) -> bool {
        self.financial_years.len() == 1
    }

    pub fn is_empty(&self) -> bool {
        self.financial_years.is_empty() && self.quarters.is_empty() && self.months.is_empty()
    }

    pub fn reduce(mut self, action: PeriodAction) -> Self {
        match action {
            PeriodAction::SetFinancialYears(years) => {
                self.financial_years = years;
                if !self.has_single_year() {
                    self.quarters.clear();
                    self.months.clear();
                }
            }
            PeriodAction::SetQuarters(quarters) => {
                if !self.has_single_year() {
                    return self;
                }
                self.quarters = quarters;
                self.retain_available_months();
            }
            PeriodAction::SetMonths(months) => {
                if !self.has_single_year() {
                    return self;
                }
                self.months = months;
                self.retain_available_months();
            }
        }
        self
    }

    pub fn set_financial_years<I, S>(self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reduce(PeriodAction::SetFinancialYears(collect_set(years)))
    }

    pub fn set_quarters<I, S>(self, quarters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reduce(PeriodAction::SetQuarters(collect_set(quarters)))
    }

    pub fn set_months<I, S>(self, months: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reduce(PeriodAction::SetMonths(collect_set(months)))
    }

    /// Months that may be selected under the current quarter selection
    pub fn available_months(&self) -> BTreeSet<&'static str> {
        if self.quarters.is_empty() {
            return ALL_MONTHS.into_iter().collect();
        }

        self.quarters
            .iter()
            .filter_map(|q| q.parse::<Quarter>().ok())
            .flat_map(|q| q.months())
            .collect()
    }

    fn retain_available_months(&mut self) {
        if self.quarters.is_empty() {
            return;
        }
        let available = self.available_months();
        self.months.retain(|m| available.contains(m.as_str()));
    }

    /// Build a filter from repeated `fy`, `quarter` and `month` query keys.
    /// The keys are replayed through the reducer in that order.
    pub fn from_query(pairs: &[(String, String)]) -> Self {
        let values = |key: &str| -> BTreeSet<String> {
            pairs
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .collect()
        };

        Self::new()
            .reduce(PeriodAction::SetFinancialYears(values("fy")))
            .reduce(PeriodAction::SetQuarters(values("quarter")))
            .reduce(PeriodAction::SetMonths(values("month")))
    }

    /// Repeated query pairs in the fixed order fy, quarter, month
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        pairs.extend(self.financial_years.iter().map(|v| ("fy", v.clone())));
        pairs.extend(self.quarters.iter().map(|v| ("quarter", v.clone())));
        pairs.extend(self.months.iter().map(|v| ("month", v.clone())));
        pairs
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        if !self.financial_years.is_empty() {
            let fy = FinancialYear::containing(date).to_string();
            if !self.financial_years.contains(&fy) {
                return false;
            }
        }

        if self.has_single_year() {
            if !self.quarters.is_empty()
                && !self.quarters.contains(Quarter::containing(date).as_str())
            {
                return false;
            }
            if !self.months.is_empty() && !self.months.contains(&month_label(date)) {
                return false;
            }
        }

        true
    }

    /// Bounding `[start, end)` range of the selected, well-formed financial years.
    /// Storage uses it as a coarse pre-filter; `matches` remains authoritative.
    pub fn date_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let years: Vec<FinancialYear> = self
            .financial_years
            .iter()
            .filter_map(|fy| fy.parse().ok())
            .collect();

        let start = years.iter().filter_map(|fy| fy.start_date()).min()?;
        let end = years.iter().filter_map(|fy| fy.end_date_exclusive()).max()?;
        Some((start, end))
    }
}

fn collect_set<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_invariants(filter: &PeriodFilter) {
        if !filter.has_single_year() {
            assert!(filter.quarters().is_empty(), "quarters kept without single FY: {:?}", filter);
            assert!(filter.months().is_empty(), "months kept without single FY: {:?}", filter);
        }
        if !filter.quarters().is_empty() {
            let available = filter.available_months();
            for month in filter.months() {
                assert!(available.contains(month.as_str()), "month {} outside quarters: {:?}", month, filter);
            }
        }
    }

    #[test]
    fn test_financial_year_parse_and_display() {
        let fy: FinancialYear = "2024-25".parse().unwrap();
        assert_eq!(fy.start_year(), 2024);
        assert_eq!(fy.to_string(), "2024-25");

        let fy: FinancialYear = "1999-00".parse().unwrap();
        assert_eq!(fy.to_string(), "1999-00");

        assert!("2024-26".parse::<FinancialYear>().is_err());
        assert!("2024".parse::<FinancialYear>().is_err());
        assert!("FY24-25".parse::<FinancialYear>().is_err());
    }

    #[test]
    fn test_financial_year_containing() {
        assert_eq!(FinancialYear::containing(date(2024, 4, 1)).to_string(), "2024-25");
        assert_eq!(FinancialYear::containing(date(2025, 3, 31)).to_string(), "2024-25");
        assert_eq!(FinancialYear::containing(date(2024, 3, 31)).to_string(), "2023-24");
    }

    #[test]
    fn test_quarter_months() {
        assert_eq!(Quarter::Q1.months(), ["04", "05", "06"]);
        assert_eq!(Quarter::Q4.months(), ["01", "02", "03"]);
        assert_eq!(Quarter::containing(date(2025, 2, 10)), Quarter::Q4);
        assert_eq!(Quarter::containing(date(2024, 11, 10)), Quarter::Q3);
        assert!("Q5".parse::<Quarter>().is_err());
    }

    #[test]
    fn test_quarter_allowed_with_single_year_then_cleared_by_second_year() {
        let filter = PeriodFilter::new().set_financial_years(["2024-25"]).set_quarters(["Q1"]);
        assert!(filter.quarters().contains("Q1"));

        let filter = filter.set_financial_years(["2024-25", "2023-24"]);
        assert!(filter.quarters().is_empty());
        assert!(filter.months().is_empty());
    }

    #[test]
    fn test_selecting_quarter_drops_months_outside_it() {
        let filter = PeriodFilter::new()
            .set_financial_years(["2024-25"])
            .set_months(["07"])
            .set_quarters(["Q1"]);

        assert!(filter.months().is_empty());
        assert_eq!(
            filter.available_months(),
            ["04", "05", "06"].into_iter().collect::<BTreeSet<_>>()
        );

        let filter = PeriodFilter::new()
            .set_financial_years(["2024-25"])
            .set_months(["05", "07"])
            .set_quarters(["Q1"]);
        assert_eq!(filter.months().iter().map(String::as_str).collect::<Vec<_>>(), vec!["05"]);
    }

    #[test]
    fn test_quarter_and_month_ignored_without_single_year() {
        let filter = PeriodFilter::new().set_quarters(["Q2"]).set_months(["08"]);
        assert!(filter.is_empty());

        let filter = PeriodFilter::new()
            .set_financial_years(["2023-24", "2024-25"])
            .set_quarters(["Q2"]);
        assert!(filter.quarters().is_empty());
    }

    #[test]
    fn test_invariants_hold_for_every_action_sequence() {
        let year_choices: Vec<Vec<&str>> = vec![vec![], vec!["2024-25"], vec!["2023-24", "2024-25"]];
        let quarter_choices: Vec<Vec<&str>> = vec![vec![], vec!["Q1"], vec!["Q2", "Q4"], vec!["Q9"]];
        let month_choices: Vec<Vec<&str>> = vec![vec![], vec!["04"], vec!["07", "01"], vec!["13"]];

        let mut actions = Vec::new();
        for y in &year_choices {
            actions.push(PeriodAction::SetFinancialYears(collect_set(y.clone())));
        }
        for q in &quarter_choices {
            actions.push(PeriodAction::SetQuarters(collect_set(q.clone())));
        }
        for m in &month_choices {
            actions.push(PeriodAction::SetMonths(collect_set(m.clone())));
        }

        // every sequence of three actions
        for a in &actions {
            for b in &actions {
                for c in &actions {
                    let mut filter = PeriodFilter::new();
                    for action in [a, b, c] {
                        filter = filter.reduce(action.clone());
                        assert_invariants(&filter);
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_query_replays_cascade() {
        let pairs = vec![
            ("fy".to_string(), "2024-25".to_string()),
            ("quarter".to_string(), "Q1".to_string()),
            ("month".to_string(), "05".to_string()),
            ("month".to_string(), "09".to_string()),
        ];
        let filter = PeriodFilter::from_query(&pairs);
        assert_eq!(filter.months().iter().map(String::as_str).collect::<Vec<_>>(), vec!["05"]);

        let pairs = vec![
            ("fy".to_string(), "2024-25".to_string()),
            ("fy".to_string(), "2023-24".to_string()),
            ("month".to_string(), "05".to_string()),
        ];
        let filter = PeriodFilter::from_query(&pairs);
        assert!(filter.months().is_empty());
        assert_eq!(filter.financial_years().len(), 2);
    }

    #[test]
    fn test_matches() {
        let filter = PeriodFilter::new().set_financial_years(["2024-25"]).set_quarters(["Q4"]);
        assert!(filter.matches(date(2025, 2, 1)));
        assert!(!filter.matches(date(2024, 5, 1)));
        assert!(!filter.matches(date(2024, 2, 1)));

        let filter = PeriodFilter::new().set_financial_years(["2024-25"]).set_months(["06"]);
        assert!(filter.matches(date(2024, 6, 30)));
        assert!(!filter.matches(date(2024, 7, 1)));

        assert!(PeriodFilter::new().matches(date(2001, 1, 1)));
    }

    #[test]
    fn test_unrecognised_values_match_nothing() {
        let filter = PeriodFilter::new().set_financial_years(["24-25"]);
        assert!(!filter.matches(date(2024, 6, 1)));

        let filter = PeriodFilter::new().set_financial_years(["2024-25"]).set_quarters(["Q7"]);
        assert!(!filter.matches(date(2024, 6, 1)));

        let filter = PeriodFilter::new().set_financial_years(["2024-25"]).set_months(["6"]);
        assert!(!filter.matches(date(2024, 6, 1)));
    }

    #[test]
    fn test_date_window() {
        let filter = PeriodFilter::new().set_financial_years(["2023-24", "2024-25", "bogus"]);
        assert_eq!(filter.date_window(), Some((date(2023, 4, 1), date(2025, 4, 1))));
        assert_eq!(PeriodFilter::new().date_window(), None);
    }
}
