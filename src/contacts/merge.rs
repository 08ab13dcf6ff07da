// Contact list rules.
// Dedupe by name, merge without losing values, and combine CSV generations.

use std::collections::{HashMap, HashSet};

use super::model::{Contact, ContactRow, UNKNOWN};

/// Keep the first contact for every name.
pub fn deduplicate(contacts: Vec<Contact>) -> Vec<Contact> {
    let mut seen = HashSet::new();
    contacts
        .into_iter()
        .filter(|c| seen.insert(c.name.clone()))
        .collect()
}

/// Contacts that point at a subpage worth a second visit.
pub fn with_subpages(contacts: &[Contact]) -> Vec<Contact> {
    contacts
        .iter()
        .filter(|c| {
            if c.contact_url.is_none() {
                log::warn!("No subpage found for contact {}", c.name);
                false
            } else {
                true
            }
        })
        .cloned()
        .collect()
}

/// Merge `incoming` into `base` by name.
///
/// Present values fill absent ones; two different present values are kept
/// side by side as `old | new`. Order follows first appearance.
pub fn merge(base: Vec<Contact>, incoming: Vec<Contact>) -> Vec<Contact> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, Contact> = HashMap::new();

    for contact in base {
        if !merged.contains_key(&contact.name) {
            order.push(contact.name.clone());
        }
        merged.insert(contact.name.clone(), contact);
    }

    for mut contact in incoming {
        let Some(existing) = merged.get_mut(&contact.name) else {
            order.push(contact.name.clone());
            merged.insert(contact.name.clone(), contact);
            continue;
        };

        for ((_, slot), (_, value)) in existing.fields_mut().into_iter().zip(contact.fields_mut()) {
            let Some(value) = value.take() else {
                continue;
            };
            match slot {
                Some(old) if !old.is_empty() && *old != value => {
                    *old = format!("{} | {}", old, value);
                }
                _ => *slot = Some(value),
            }
        }
    }

    order
        .into_iter()
        .filter_map(|name| merged.remove(&name))
        .collect()
}

/// Replace every absent field with the unknown placeholder.
pub fn fill_unknown(contacts: &mut [Contact]) {
    for contact in contacts {
        for (_, value) in contact.fields_mut() {
            if value.is_none() {
                *value = Some(UNKNOWN.to_string());
            }
        }
    }
}

/// Combine a previous CSV generation with freshly crawled rows.
///
/// Rows are deduplicated on `(name, start_url)` keeping the updated row, then
/// grouped by start URL with updated rows ahead of the original ones.
pub fn merge_original_and_updated(
    original: Vec<ContactRow>,
    updated: Vec<ContactRow>,
) -> Vec<ContactRow> {
    // 0 = updated, 1 = original
    let tagged: Vec<(u8, ContactRow)> = original
        .into_iter()
        .map(|r| (1, r))
        .chain(updated.into_iter().map(|r| (0, r)))
        .collect();

    let mut last_index: HashMap<(String, Option<String>), usize> = HashMap::new();
    for (i, (_, row)) in tagged.iter().enumerate() {
        last_index.insert((row.name.clone(), row.start_url.clone()), i);
    }

    let mut kept: Vec<(u8, ContactRow)> = tagged
        .into_iter()
        .enumerate()
        .filter(|(i, (_, row))| {
            last_index.get(&(row.name.clone(), row.start_url.clone())) == Some(i)
        })
        .map(|(_, tagged)| tagged)
        .collect();

    kept.sort_by(|(sa, a), (sb, b)| a.start_url.cmp(&b.start_url).then(sa.cmp(sb)));
    kept.into_iter().map(|(_, row)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, email: Option<&str>, url: Option<&str>) -> Contact {
        Contact {
            email: email.map(String::from),
            contact_url: url.map(String::from),
            ..Contact::new(name)
        }
    }

    fn row(name: &str, start_url: &str, phone: &str) -> ContactRow {
        ContactRow {
            name: name.to_string(),
            start_url: Some(start_url.to_string()),
            phone: Some(phone.to_string()),
            ..ContactRow::default()
        }
    }

    #[test]
    fn test_deduplicate_keeps_first() {
        let contacts = vec![
            contact("A", Some("first@a.de"), None),
            contact("B", None, None),
            contact("A", Some("second@a.de"), None),
        ];
        let unique = deduplicate(contacts);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].email.as_deref(), Some("first@a.de"));
        assert_eq!(unique[1].name, "B");
    }

    #[test]
    fn test_with_subpages_filters_missing_urls() {
        let contacts = vec![
            contact("A", None, Some("https://a.de/a")),
            contact("B", None, None),
        ];
        let with = with_subpages(&contacts);
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].name, "A");
    }

    #[test]
    fn test_merge_fills_and_joins() {
        let base = vec![
            contact("A", Some("a@old.de"), None),
            contact("B", None, None),
        ];
        let mut refined_a = contact("A", Some("a@new.de"), Some("https://a.de"));
        refined_a.phone = Some("0123".to_string());
        let incoming = vec![refined_a, contact("C", None, None)];

        let merged = merge(base, incoming);
        let names: Vec<&str> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        assert_eq!(merged[0].email.as_deref(), Some("a@old.de | a@new.de"));
        assert_eq!(merged[0].contact_url.as_deref(), Some("https://a.de"));
        assert_eq!(merged[0].phone.as_deref(), Some("0123"));
    }

    #[test]
    fn test_merge_equal_values_not_duplicated() {
        let base = vec![contact("A", Some("same@a.de"), None)];
        let incoming = vec![contact("A", Some("same@a.de"), None)];
        let merged = merge(base, incoming);
        assert_eq!(merged[0].email.as_deref(), Some("same@a.de"));
    }

    #[test]
    fn test_fill_unknown() {
        let mut contacts = vec![contact("A", Some("a@a.de"), None)];
        fill_unknown(&mut contacts);
        assert_eq!(contacts[0].email.as_deref(), Some("a@a.de"));
        assert_eq!(contacts[0].phone.as_deref(), Some(UNKNOWN));
        assert_eq!(contacts[0].start_url.as_deref(), Some(UNKNOWN));
    }

    #[test]
    fn test_merge_original_and_updated() {
        let original = vec![
            row("A", "https://b.de", "old-a"),
            row("B", "https://b.de", "old-b"),
            row("C", "https://a.de", "old-c"),
        ];
        let updated = vec![
            row("A", "https://b.de", "new-a"),
            row("D", "https://a.de", "new-d"),
        ];

        let merged = merge_original_and_updated(original, updated);
        let phones: Vec<&str> = merged
            .iter()
            .map(|r| r.phone.as_deref().unwrap_or_default())
            .collect();

        assert_eq!(phones, vec!["new-d", "old-c", "new-a", "old-b"]);
    }
}
