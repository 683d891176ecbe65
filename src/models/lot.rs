// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Inventory lots from the ERP and the revision rule used to pick the
//! newest lot per product serial.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Picture links attached to a lot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LotPictures {
    #[serde(default)]
    pub original: Option<String>,
}

/// Lot as returned by the ERP lots endpoint (unused fields are ignored)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lot {
    pub number: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pictures: Option<LotPictures>,
}

/// Envelope of the lots endpoint
#[derive(Debug, Deserialize)]
pub struct LotsResponse {
    pub lots: Vec<Lot>,
}

/// Revision suffix of a lot number: a letter followed by a number, e.g. `A2`.
///
/// Ordering compares the letter first and the number second, so `A9 < B1`.
/// A missing or unparseable number sorts below any parsed one.
#[derive(Debug, Clone)]
pub struct Revision {
    raw: String,
    letter: Option<char>,
    number: Option<u32>,
}

impl Revision {
    pub fn parse(raw: &str) -> Self {
        let mut chars = raw.chars();
        let letter = chars.next();
        let number = chars.as_str().parse().ok();
        Self {
            raw: raw.to_string(),
            letter,
            number,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.letter
            .cmp(&other.letter)
            .then_with(|| self.number.cmp(&other.number))
    }
}

impl PartialEq for Revision {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Revision {}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dotted lot number `serial.revision`, e.g. `100.A2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotNumber {
    pub serial: String,
    pub revision: Revision,
}

impl LotNumber {
    /// Split on the first dot. A number without a dot has an empty revision.
    pub fn parse(number: &str) -> Self {
        let (serial, revision) = number.split_once('.').unwrap_or((number, ""));
        Self {
            serial: serial.to_string(),
            revision: Revision::parse(revision),
        }
    }
}

/// Product row derived from the newest lot of a serial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotRecord {
    /// Product id (the lot serial)
    pub node_id: String,
    pub node_revision: String,
    pub number: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub img_url: Option<String>,
}

impl From<&Lot> for LotRecord {
    fn from(lot: &Lot) -> Self {
        let number = LotNumber::parse(&lot.number);
        Self {
            node_id: number.serial,
            node_revision: number.revision.as_str().to_string(),
            number: lot.number.clone(),
            name: lot.name.clone(),
            description: lot.description.clone(),
            img_url: lot.pictures.as_ref().and_then(|p| p.original.clone()),
        }
    }
}

/// Keep only the newest revision of every serial.
///
/// Output follows the order in which serials first appear. On equal
/// revisions the earlier lot wins.
pub fn newest_lot_revisions(lots: &[Lot]) -> Vec<LotRecord> {
    let mut newest: Vec<(Revision, LotRecord)> = Vec::new();
    let mut index_by_serial: HashMap<String, usize> = HashMap::new();

    for lot in lots {
        let revision = LotNumber::parse(&lot.number).revision;
        let record = LotRecord::from(lot);

        match index_by_serial.get(&record.node_id) {
            Some(&index) => {
                if revision > newest[index].0 {
                    newest[index] = (revision, record);
                }
            }
            None => {
                index_by_serial.insert(record.node_id.clone(), newest.len());
                newest.push((revision, record));
            }
        }
    }

    newest.into_iter().map(|(_, record)| record).collect()
}
