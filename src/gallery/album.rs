use super::{AlbumGroup, AlbumGroupView, AlbumLink, AlbumNameRecord, AlbumYear, encode_path};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// Split a folder name like `2021-04-10_Birthday_Party` into its date and a
/// display title (`Birthday Party`).
///
/// Names whose first token is not shaped like `YYYY-MM-DD` keep the whole
/// name as title and get no date. A token with the right shape but an
/// impossible calendar date (`2021-13-40`) is treated the same way.
pub fn parse_album_name(name: &str, separator: char) -> AlbumNameRecord {
    let mut tokens = name.split(separator);
    let first = tokens.next().unwrap_or_default();
    let rest = tokens.collect::<Vec<_>>().join(" ");

    let bytes = first.as_bytes();
    let date_shaped = bytes.len() >= 10 && bytes[4] == b'-' && bytes[7] == b'-';

    let date = if date_shaped {
        match NaiveDate::parse_from_str(first, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(e) => {
                debug!("Album {:?} has an invalid date prefix: {}", name, e);
                None
            }
        }
    } else {
        None
    };

    match date {
        Some(date) => AlbumNameRecord {
            date: Some(date),
            title: rest,
            raw_name: name.to_string(),
        },
        None => AlbumNameRecord {
            date: None,
            title: name.to_string(),
            raw_name: name.to_string(),
        },
    }
}

/// Bucket folder names by year, newest year first, undated folders last.
///
/// Within a bucket the names keep reverse lexicographic order, which for
/// date-prefixed names means newest album first.
pub fn group_albums<S: AsRef<str>>(names: &[S], separator: char) -> Vec<AlbumGroup> {
    let mut sorted: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    sorted.sort_by(|a, b| b.cmp(a));

    let mut buckets: BTreeMap<AlbumYear, Vec<AlbumNameRecord>> = BTreeMap::new();
    for name in sorted {
        let record = parse_album_name(name, separator);
        let year = record
            .date
            .map(|date| AlbumYear::Year(date.year()))
            .unwrap_or(AlbumYear::Unsorted);
        buckets.entry(year).or_default().push(record);
    }

    buckets
        .into_iter()
        .map(|(year, records)| AlbumGroup { year, records })
        .collect()
}

/// Link target for an album inside `parent_path` (empty at the gallery root).
pub fn album_href(parent_path: &str, raw_name: &str) -> String {
    if parent_path.is_empty() {
        format!("/pics/{}", urlencoding::encode(raw_name))
    } else {
        format!(
            "/pics/{}/{}",
            encode_path(parent_path),
            urlencoding::encode(raw_name)
        )
    }
}

impl AlbumNameRecord {
    /// `10 Apr: Birthday` for dated albums, the bare title otherwise.
    pub fn label(&self) -> String {
        match self.date {
            Some(date) => format!("{}: {}", date.format("%d %b"), self.title),
            None => self.title.clone(),
        }
    }
}

impl AlbumGroup {
    pub fn caption(&self) -> String {
        match self.year {
            AlbumYear::Year(year) => year.to_string(),
            AlbumYear::Unsorted => "Unsorted".to_string(),
        }
    }

    pub fn to_view(&self, parent_path: &str) -> AlbumGroupView {
        AlbumGroupView {
            caption: self.caption(),
            is_unsorted: self.year == AlbumYear::Unsorted,
            entries: self
                .records
                .iter()
                .map(|record| AlbumLink {
                    label: record.label(),
                    href: album_href(parent_path, &record.raw_name),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dated_name_splits_into_date_and_title() {
        let record = parse_album_name("2021-04-10_Birthday_Party", '_');
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2021, 4, 10));
        assert_eq!(record.title, "Birthday Party");
        assert_eq!(record.raw_name, "2021-04-10_Birthday_Party");
    }

    #[test]
    fn undated_names_keep_the_original_string() {
        for name in ["Randomfolder", "2021_Trip", "holiday-2020-x_y", "", "2021-0410_x"] {
            let record = parse_album_name(name, '_');
            assert_eq!(record.date, None, "{name}");
            assert_eq!(record.title, name);
            assert_eq!(record.raw_name, name);
        }
    }

    #[test]
    fn calendar_invalid_date_falls_back_to_unsorted() {
        let record = parse_album_name("2021-13-40_Nope", '_');
        assert_eq!(record.date, None);
        assert_eq!(record.title, "2021-13-40_Nope");
    }

    #[test]
    fn custom_separator() {
        let record = parse_album_name("2019-12-24 Christmas Eve", ' ');
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2019, 12, 24));
        assert_eq!(record.title, "Christmas Eve");
    }

    #[test]
    fn groups_by_year_with_unsorted_last() {
        let names = ["Randomfolder", "2020-01-01_A", "2021-06-01_B"];
        let groups = group_albums(&names, '_');

        let summary: Vec<(AlbumYear, Vec<&str>)> = groups
            .iter()
            .map(|g| (g.year, g.records.iter().map(|r| r.title.as_str()).collect()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (AlbumYear::Year(2021), vec!["B"]),
                (AlbumYear::Year(2020), vec!["A"]),
                (AlbumYear::Unsorted, vec!["Randomfolder"]),
            ]
        );
    }

    #[test]
    fn records_within_a_year_are_newest_first() {
        let names = ["2021-01-05_Ski", "2021-08-20_Beach", "2021-03-01_Spring"];
        let groups = group_albums(&names, '_');

        assert_eq!(groups.len(), 1);
        let titles: Vec<_> = groups[0].records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Beach", "Spring", "Ski"]);
    }

    #[test]
    fn grouping_is_stable_and_unsorted_only_when_needed() {
        let names = vec!["2018-05-05_X".to_string(), "2022-02-02_Y".to_string()];
        let first = group_albums(&names, '_');
        let second = group_albums(&names, '_');
        assert_eq!(first, second);
        assert!(first.iter().all(|g| g.year != AlbumYear::Unsorted));
        assert!(group_albums::<&str>(&[], '_').is_empty());
    }

    #[test]
    fn view_labels_and_links() {
        let groups = group_albums(&["2021-04-10_Birthday", "Misc stuff"], '_');

        let dated = groups[0].to_view("");
        assert_eq!(dated.caption, "2021");
        assert!(!dated.is_unsorted);
        assert_eq!(dated.entries[0].label, "10 Apr: Birthday");
        assert_eq!(dated.entries[0].href, "/pics/2021-04-10_Birthday");

        let unsorted = groups[1].to_view("family/old");
        assert_eq!(unsorted.caption, "Unsorted");
        assert!(unsorted.is_unsorted);
        assert_eq!(unsorted.entries[0].label, "Misc stuff");
        assert_eq!(unsorted.entries[0].href, "/pics/family/old/Misc%20stuff");
    }
}
