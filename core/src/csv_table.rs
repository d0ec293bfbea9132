//! CSV table loader.
//!
//! Plain comma splitting, no quoting. The first line is always the header.
//! Rows that are too short are skipped; numeric fields parse best-effort.

use crate::types::{ParticipantId, ProductId, TrialNumber, SHELF_COUNT};

const PRODUCT_COLUMNS: usize = 3;
const TRIAL_COLUMNS: usize = 2 + SHELF_COUNT;

/// `id,name,price`
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub id:    ProductId,
    pub name:  String,
    pub price: f32,
}

/// `participantId,trialNumber,shelfOne..shelfFour`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRow {
    pub participant_id:    ParticipantId,
    pub trial_number:      TrialNumber,
    pub shelf_product_ids: [ProductId; SHELF_COUNT],
}

/// Split on `\r`, `\n` and `\r\n` alike, dropping empty fragments.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\r', '\n']).filter(|line| !line.is_empty())
}

/// Every line after the header that has something on it.
pub fn data_rows(text: &str) -> impl Iterator<Item = &str> {
    // Header is the first physical line, even if it is blank.
    let body = match text.find(['\r', '\n']) {
        Some(end) => &text[end..],
        None => "",
    };
    split_lines(body).filter(|line| !line.trim().is_empty())
}

fn columns(line: &str) -> Vec<&str> {
    line.split(',').collect()
}

fn int_or_zero(field: &str) -> i32 {
    field.trim().parse().unwrap_or(0)
}

pub fn parse_products(text: &str) -> Vec<ProductRow> {
    let mut rows = Vec::new();
    for line in data_rows(text) {
        let cols = columns(line);
        if cols.len() < PRODUCT_COLUMNS {
            log::debug!("products: skipping short row '{line}'");
            continue;
        }
        match (cols[0].trim().parse::<ProductId>(), cols[2].trim().parse::<f32>()) {
            (Ok(id), Ok(price)) => rows.push(ProductRow {
                id,
                name: cols[1].trim().to_string(),
                price,
            }),
            _ => log::debug!("products: skipping unparsable row '{line}'"),
        }
    }
    rows
}

pub fn parse_trials(text: &str) -> Vec<TrialRow> {
    let mut rows = Vec::new();
    for line in data_rows(text) {
        let cols = columns(line);
        if cols.len() < TRIAL_COLUMNS {
            log::debug!("trials: skipping short row '{line}'");
            continue;
        }
        let mut shelf_product_ids = [0; SHELF_COUNT];
        for (slot, field) in shelf_product_ids.iter_mut().zip(&cols[2..TRIAL_COLUMNS]) {
            *slot = int_or_zero(field);
        }
        rows.push(TrialRow {
            participant_id: int_or_zero(cols[0]),
            trial_number: int_or_zero(cols[1]),
            shelf_product_ids,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings_are_treated_alike() {
        let lines: Vec<_> = split_lines("a\r\nb\rc\n\nd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn header_and_blank_rows_are_skipped() {
        let text = "id,name,price\n\n1,Soda,1.50\n   \n2,Chips,2.25\n";
        let rows = parse_products(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].name, "Soda");
        assert_eq!(rows[1].price, 2.25);
    }

    #[test]
    fn leading_blank_line_is_the_header() {
        let rows = parse_products("\n1,Soda,1.50\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);

        // The real header then lands in the body and reads as an all-zero trial.
        let rows = parse_trials("\r\np,t,a,b,c,d\r\n1,1,5,6,7,8\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].shelf_product_ids, [0, 0, 0, 0]);
        assert_eq!(rows[1].shelf_product_ids, [5, 6, 7, 8]);
    }

    #[test]
    fn header_only_yields_nothing() {
        assert!(parse_products("id,name,price").is_empty());
        assert!(parse_trials("").is_empty());
    }

    #[test]
    fn product_rows_missing_columns_or_numbers_are_dropped() {
        let text = "id,name,price\n1,Soda\nx,Bad,1.0\n3,Gum,cheap\n4,Mints,0.99,extra\n";
        let rows = parse_products(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 4);
        assert_eq!(rows[0].price, 0.99);
    }

    #[test]
    fn short_trial_row_is_skipped_entirely() {
        let text = "p,t,a,b,c,d\n1,1,5,6\n1,2,5,6,7,8\n";
        let rows = parse_trials(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trial_number, 2);
        assert_eq!(rows[0].shelf_product_ids, [5, 6, 7, 8]);
    }

    #[test]
    fn bad_trial_field_becomes_zero() {
        let rows = parse_trials("header\r\n2, 3 ,x,10,11,12\r\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].participant_id, 2);
        assert_eq!(rows[0].trial_number, 3);
        assert_eq!(rows[0].shelf_product_ids, [0, 10, 11, 12]);
    }
}
