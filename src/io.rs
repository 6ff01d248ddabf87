/**
 * ShowReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::fmt::Display;
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::{stdout, BufReader};
use std::path::Path;

use fnv::FnvHashSet;
use serde_derive::Serialize;
use tracing::warn;

use crate::curated::{CuratedCatalog, CuratedShow};
use crate::error::{Error, Result};
use crate::evaluation::Report;
use crate::normalize::{Normalizer, UserRecord};

/// Reads user records, one JSON object per line. Lines are decoded lossily, invalid bytes
/// surface as replacement characters and are reported by the normalizer. Lines that are not
/// valid records are skipped.
pub fn records_from_reader<R: BufRead>(mut reader: R) -> Result<Vec<UserRecord>> {

    let mut records = Vec::new();
    let mut buffer = Vec::new();
    let mut line_number: u64 = 0;

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }
        line_number += 1;

        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<UserRecord>(line) {
            Ok(record) => records.push(record),
            Err(error) => warn!(line = line_number, %error, "Skipping unreadable user record"),
        }
    }

    Ok(records)
}

pub fn read_records(file: &str) -> Result<Vec<UserRecord>> {
    records_from_reader(BufReader::new(File::open(file)?))
}

/// Stopwords are given as a single comma separated list.
pub fn stopwords_from_reader<R: Read>(mut reader: R) -> Result<FnvHashSet<String>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    Ok(text.split(',')
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect())
}

pub fn read_stopwords(file: &str) -> Result<FnvHashSet<String>> {
    stopwords_from_reader(File::open(file)?)
}

/// Reads the curated catalog. We expect NO headers, and a title, genre and text column per
/// line with tab separation. The text column is not used for matching or features.
pub fn catalog_from_reader<R: Read>(reader: R, normalizer: &Normalizer) -> Result<CuratedCatalog> {

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut shows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;

        if record.len() < 3 {
            let line = record.position().map(|position| position.line()).unwrap_or(0);
            return Err(Error::MalformedCatalogRow { line });
        }

        shows.push(CuratedShow::from_columns(&record[0], &record[1], normalizer));
    }

    Ok(CuratedCatalog::new(shows))
}

pub fn read_catalog(file: &str, normalizer: &Normalizer) -> Result<CuratedCatalog> {
    catalog_from_reader(File::open(file)?, normalizer)
}

fn output(path: Option<&str>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(File::create(&Path::new(path))?)),
        _ => Ok(Box::new(stdout())),
    }
}

/// Output the evaluation report in JSON format. If a `report_path` is supplied, we write to a
/// file at the specified path, otherwise, we output to stdout.
pub fn write_report(report: &Report, report_path: Option<&str>) -> Result<()> {
    let mut out = output(report_path)?;

    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;

    Ok(())
}

/// Struct used for JSON serialization of computed recommendations. Field names will be used
/// in JSON.
#[derive(Serialize)]
struct Recommendations<'a> {
    for_user: &'a str,
    recommended_items: &'a [&'a str],
}

/// Output the recommendations for a user in JSON format, using the original show names.
pub fn write_recommendations(
    user: &str,
    items: &[&str],
    recommendations_path: Option<&str>,
) -> Result<()> {
    let mut out = output(recommendations_path)?;

    let recommendations = Recommendations { for_user: user, recommended_items: items };
    writeln!(out, "{}", serde_json::to_string(&recommendations)?)?;

    Ok(())
}

/// Writes a dense matrix with one space separated row per line.
pub fn write_matrix<T: Display, W: Write>(rows: &[Vec<T>], mut out: W) -> Result<()> {
    for row in rows {
        let mut first = true;
        for value in row {
            if !first {
                write!(out, " ")?;
            }
            write!(out, "{}", value)?;
            first = false;
        }
        writeln!(out)?;
    }

    Ok(())
}

pub fn write_matrix_to_file<T: Display>(rows: &[Vec<T>], file: &str) -> Result<()> {
    write_matrix(rows, io::BufWriter::new(File::create(&Path::new(file))?))
}

#[cfg(test)]
mod tests {

    use std::io::Cursor;

    use crate::io;
    use crate::normalize::{Normalizer, NormalizerConfig};

    #[test]
    fn records_are_read_leniently() {
        let mut input: Vec<u8> = Vec::new();
        input.extend_from_slice(b"{\"id\": \"a1\", \"tv\": \"Lost, The Wire\", \"teams\": \"N/A\"}\n");
        input.extend_from_slice(b"not json\n\n");
        input.extend_from_slice(b"{\"id\": \"b2\", \"about\": \"caf\xff\"}\n");

        let records = io::records_from_reader(Cursor::new(input)).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a1");
        assert_eq!(records[0].tv.as_ref().map(|tv| tv.as_str()), Some("Lost, The Wire"));
        assert!(records[0].about.is_none());
        assert!(records[1].about.as_ref().unwrap().contains('\u{FFFD}'));
    }

    #[test]
    fn stopwords_are_comma_separated() {
        let stopwords = io::stopwords_from_reader(Cursor::new("a, the,And\n")).unwrap();

        assert_eq!(stopwords.len(), 3);
        assert!(stopwords.contains("and"));
    }

    #[test]
    fn catalog_rows_need_three_columns() {
        let normalizer = Normalizer::new(NormalizerConfig::default()).unwrap();

        let catalog = io::catalog_from_reader(
            Cursor::new("the wire\tcrime\tbaltimor\nlost\tdrama\tisland\n"), &normalizer).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.shows()[1].title, vec!["lost"]);

        assert!(io::catalog_from_reader(Cursor::new("the wire\tcrime\n"), &normalizer).is_err());
    }

    #[test]
    fn recommendations_are_written_as_json() {
        let path = std::env::temp_dir().join("showreco_recommendations_test.json");
        let path = path.to_str().unwrap();

        io::write_recommendations("a1", &["lost", "the wire"], Some(path)).unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, "{\"for_user\":\"a1\",\"recommended_items\":[\"lost\",\"the wire\"]}\n");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn matrices_are_space_separated() {
        let mut out: Vec<u8> = Vec::new();
        io::write_matrix(&[vec![1, 0, 1], vec![0, 2, 0]], &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1 0 1\n0 2 0\n");
    }
}
