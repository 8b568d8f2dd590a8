//! Registry class catalog.
//!
//! The search form carries the live class list in its multi-select; when
//! that cannot be read, a fixed default catalog stands in. Catalog
//! lookups never fail: any scrape error falls back to the default.

use chromiumoxide::Page;
use tracing::error;

use crate::browser::BrowserError;

use super::types::TrademarkClass;

const DEFAULT_TRADEMARK_CLASSES: &[(&str, &str)] = &[
    ("1", "1 - Chemicals for use in industry"),
    ("2", "2 - Paints, dyes and inks"),
    ("3", "3 - Cleaning preparations and cosmetics"),
    ("4", "4 - Lubricants, fuels and candles"),
    ("5", "5 - Pharmaceuticals, medical and veterinary preparations"),
    ("6", "6 - Common metals and their alloys; metallic building materials"),
    ("7", "7 - Machines for treatment of materials and for manufacturing"),
    ("8", "8 - Hand tools, cutlery and sidearms"),
    ("9", "9 - Scientific, audio, visual, telecommunication and computer equipment"),
    ("10", "10 - Medical and veterinary equipment"),
    ("11", "11 - Lighting, heating and sanitary apparatus"),
    ("12", "12 - Vehicles"),
    ("13", "13 - Firearms, explosives and fireworks"),
    ("14", "14 - Jewellery and watches"),
    ("15", "15 - Musical instruments"),
    ("16", "16 - Printed matter and stationery"),
    ("17", "17 - Plastics in extruded form for use in manufacture; insulating materials"),
    ("18", "18 - Leather and imitations of leather; luggage, umbrellas, walking sticks and saddlery"),
    ("19", "19 - Non-metallic building materials"),
    ("20", "20 - Furniture and furnishings"),
    ("21", "21 - Household utensils; glassware, porcelain and earthenware"),
    ("22", "22 - Ropes, string, tents, tarpaulins and sails"),
    ("23", "23 - Yarns and threads"),
    ("24", "24 - Textiles and household linen"),
    ("25", "25 - Clothing, footwear, headgear"),
    ("26", "26 - Lace and embroidery, fastenings and hair decorations"),
    ("27", "27 - Carpets and other materials for covering existing floors"),
    ("28", "28 - Toys, playthings, sporting articles and video game apparatus"),
    ("29", "29 - Foodstuffs (meat, fish, fruit, vegetables, eggs and dairy products)"),
    ("30", "30 - Foodstuffs (coffee, tea, flour, bread, sugar and confectionery)"),
    (
        "31",
        "31 - Raw agricultural, horticultural and forestry products, live animals and fresh fruit and vegetables",
    ),
    ("32", "32 - Beers and non-alcoholic drinks"),
    ("33", "33 - Alcoholic drinks (except beers)"),
    ("34", "34 - Tobacco, smokers' articles and electronic cigarettes"),
    ("35", "35 - Advertising, business management and retail services"),
    ("36", "36 - Financial and real estate services"),
    ("37", "37 - Building construction, repair and installation services"),
    ("38", "38 - Telecommunications services"),
    ("39", "39 - Transportation and storage services"),
    ("40", "40 - Material treatment services"),
    ("41", "41 - Education, entertainment, sporting and cultural activities"),
    ("42", "42 - Scientific, technological and design services"),
    ("43", "43 - Restaurant and accommodation services"),
    ("44", "44 - Medical, veterinary, beauty care and gardening services"),
    ("45", "45 - Personal, security and legal services"),
];

/// The built-in default catalog
pub fn default_trademark_classes() -> Vec<TrademarkClass> {
    DEFAULT_TRADEMARK_CLASSES
        .iter()
        .map(|(id, name)| TrademarkClass {
            id: (*id).to_string(),
            name: (*name).to_string(),
        })
        .collect()
}

/// Read the live class list from the form's multi-select
async fn fetch_available_classes(page: &Page) -> Result<Vec<TrademarkClass>, BrowserError> {
    let script = r#"(() => {
        const options = Array.from(document.querySelectorAll('select.chosen-select option'));
        const classes = options
            .filter((option) => option.value)
            .map((option) => ({ id: option.value, name: (option.textContent || '').trim() }));
        return JSON.stringify(classes);
    })()"#;

    let result = page
        .evaluate(script)
        .await
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
    let json: String = result
        .into_value()
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

    serde_json::from_str(&json).map_err(|e| BrowserError::JavaScriptError(e.to_string()))
}

/// The live catalog when readable, the default catalog otherwise
pub async fn get_trademark_classes(page: &Page) -> Vec<TrademarkClass> {
    match fetch_available_classes(page).await {
        Ok(classes) if !classes.is_empty() => classes,
        Ok(_) => default_trademark_classes(),
        Err(err) => {
            error!("cannot fetch trademark classes from the live form: {}", err);
            default_trademark_classes()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_45_entries() {
        let classes = default_trademark_classes();
        assert_eq!(classes.len(), 45);
        assert_eq!(classes[0].id, "1");
        assert_eq!(classes[44].id, "45");
    }

    #[test]
    fn default_catalog_names_carry_their_id_prefix() {
        for class in default_trademark_classes() {
            assert!(
                class.name.starts_with(&format!("{} - ", class.id)),
                "bad entry: {:?}",
                class
            );
        }
    }
}
