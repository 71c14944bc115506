//! Record Types Module
//! Typed rows for the athlete-event and NOC region tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Athlete sex as recorded in the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Sex::M),
            "F" => Ok(Sex::F),
            other => Err(format!("expected M or F, got '{other}'")),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Summer,
    Winter,
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Summer" => Ok(Season::Summer),
            "Winter" => Ok(Season::Winter),
            other => Err(format!("expected Summer or Winter, got '{other}'")),
        }
    }
}

/// Medal outcome of one participation.
///
/// `NoMedal` is never read from input; it is substituted for missing
/// cells during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
    NoMedal,
}

impl Medal {
    /// True for Gold, Silver and Bronze.
    pub fn is_medal(&self) -> bool {
        !matches!(self, Medal::NoMedal)
    }
}

impl FromStr for Medal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Gold" => Ok(Medal::Gold),
            "Silver" => Ok(Medal::Silver),
            "Bronze" => Ok(Medal::Bronze),
            other => Err(format!("expected Gold, Silver or Bronze, got '{other}'")),
        }
    }
}

/// One participation of one athlete in one event at one Games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteEvent {
    pub id: u32,
    pub name: String,
    pub sex: Sex,
    pub age: Option<u32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub team: String,
    pub noc: String,
    pub games: String,
    pub year: i32,
    pub season: Season,
    pub city: String,
    pub sport: String,
    pub event: String,
    pub medal: Option<Medal>,
}

/// Hashable view of a full row. Floats compare by bit pattern, so two
/// missing cells are equal and two identical readings are equal.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RowKey<'a> {
    id: u32,
    name: &'a str,
    sex: Sex,
    age: Option<u32>,
    height: Option<u64>,
    weight: Option<u64>,
    team: &'a str,
    noc: &'a str,
    games: &'a str,
    year: i32,
    season: Season,
    city: &'a str,
    sport: &'a str,
    event: &'a str,
    medal: Option<Medal>,
}

impl AthleteEvent {
    /// Key covering every field of the row.
    pub fn row_key(&self) -> RowKey<'_> {
        RowKey {
            id: self.id,
            name: &self.name,
            sex: self.sex,
            age: self.age,
            height: self.height.map(f64::to_bits),
            weight: self.weight.map(f64::to_bits),
            team: &self.team,
            noc: &self.noc,
            games: &self.games,
            year: self.year,
            season: self.season,
            city: &self.city,
            sport: &self.sport,
            event: &self.event,
            medal: self.medal,
        }
    }

    /// The `(year, sex)` partition used for imputation.
    pub fn partition(&self) -> (i32, Sex) {
        (self.year, self.sex)
    }

    /// True when the row carries a Gold, Silver or Bronze medal.
    pub fn won_medal(&self) -> bool {
        self.medal.is_some_and(|m| m.is_medal())
    }
}

/// One National Olympic Committee and the region it represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NocRegion {
    pub noc: String,
    pub region: Option<String>,
    pub notes: Option<String>,
}

/// Numeric athlete fields that can be imputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericField {
    Height,
    Weight,
}

impl NumericField {
    pub fn get(&self, event: &AthleteEvent) -> Option<f64> {
        match self {
            NumericField::Height => event.height,
            NumericField::Weight => event.weight,
        }
    }

    pub fn set(&self, event: &mut AthleteEvent, value: f64) {
        match self {
            NumericField::Height => event.height = Some(value),
            NumericField::Weight => event.weight = Some(value),
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericField::Height => f.write_str("height"),
            NumericField::Weight => f.write_str("weight"),
        }
    }
}

/// Central-tendency estimate for one `(year, sex)` partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEstimate {
    pub year: i32,
    pub sex: Sex,
    pub value: f64,
    pub observations: usize,
}

/// Medals per participation for one NOC, or one NOC in one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyRatio {
    pub noc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub region: Option<String>,
    pub total_medals: u64,
    pub total_athletes: u64,
    pub ratio: f64,
}
