//! Core data models for the MCPDict query service.
//!
//! The wire format is positional: a language serializes as a fixed-order
//! 14-element array, and a reading cell collapses to a bare string when it
//! holds exactly one annotation-free transcription. The shape-shifting lives
//! entirely in the `Serialize` impls here; the rest of the crate works with
//! uniform structs and enums.

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// One language variety from the `info` table.
///
/// `language_id` is the stable `ROWID` assigned by the dataset; everything
/// else is an opaque display string passed through to the frontend. The three
/// sort/color/region triples come from independent editorial sources.
#[derive(Debug, Clone)]
pub struct Language {
    pub language_id: i64,
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub atlas_sort: Option<String>,
    pub atlas_color: Option<String>,
    pub atlas_region: Option<String>,
    pub yindian_sort: Option<String>,
    pub yindian_color: Option<String>,
    pub yindian_region: Option<String>,
    pub chenfang_sort: Option<String>,
    pub chenfang_color: Option<String>,
    pub chenfang_region: Option<String>,
    pub location: Option<String>,
    /// "longitude,latitude" as a single string.
    pub coordinates: Option<String>,
}

impl Serialize for Language {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Field order is the frontend contract; do not reorder.
        let mut seq = serializer.serialize_seq(Some(14))?;
        seq.serialize_element(&self.language_id)?;
        seq.serialize_element(&self.name)?;
        seq.serialize_element(&self.abbreviation)?;
        seq.serialize_element(&self.atlas_sort)?;
        seq.serialize_element(&self.atlas_color)?;
        seq.serialize_element(&self.atlas_region)?;
        seq.serialize_element(&self.yindian_sort)?;
        seq.serialize_element(&self.yindian_color)?;
        seq.serialize_element(&self.yindian_region)?;
        seq.serialize_element(&self.chenfang_sort)?;
        seq.serialize_element(&self.chenfang_color)?;
        seq.serialize_element(&self.chenfang_region)?;
        seq.serialize_element(&self.location)?;
        seq.serialize_element(&self.coordinates)?;
        seq.end()
    }
}

/// One phonetic transcription of a character in one language variety.
///
/// The annotation, when present, is free-text example usage with the queried
/// character wrapped in `*…*` markers. The markup is produced upstream and
/// passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub transcription: String,
    pub annotation: Option<String>,
}

impl Reading {
    /// The dataset stores absent annotations as NULL or the empty string;
    /// both normalize to `None` here.
    pub fn new(transcription: String, annotation: Option<String>) -> Self {
        Self {
            transcription,
            annotation: annotation.filter(|a| !a.is_empty()),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.annotation {
            None => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&self.transcription)?;
                seq.end()
            }
            Some(annotation) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&self.transcription)?;
                seq.serialize_element(annotation)?;
                seq.end()
            }
        }
    }
}

/// The readings of one (language, character) pair.
///
/// Serializes as:
/// - `Empty` → `""`
/// - `Bare(t)` → `"t"`
/// - `Annotated(rs)` → `[[t], [t, annotation], …]`
///
/// Clients branch on the JSON type of the cell, so the collapse to a bare
/// string happens only when there is exactly one reading and it carries no
/// annotation. This is a one-way rule applied at serialization time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingCell {
    Empty,
    Bare(String),
    Annotated(Vec<Reading>),
}

impl ReadingCell {
    pub fn from_readings(readings: Vec<Reading>) -> Self {
        if readings.is_empty() {
            return ReadingCell::Empty;
        }
        if readings.len() == 1 && readings[0].annotation.is_none() {
            let mut readings = readings;
            return ReadingCell::Bare(readings.swap_remove(0).transcription);
        }
        ReadingCell::Annotated(readings)
    }
}

impl Serialize for ReadingCell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ReadingCell::Empty => serializer.serialize_str(""),
            ReadingCell::Bare(transcription) => serializer.serialize_str(transcription),
            ReadingCell::Annotated(readings) => {
                let mut seq = serializer.serialize_seq(Some(readings.len()))?;
                for reading in readings {
                    seq.serialize_element(reading)?;
                }
                seq.end()
            }
        }
    }
}
