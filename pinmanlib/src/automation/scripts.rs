//! Scripts pasted into the developer console of the payment page

use log::debug;

use crate::{pin::pin_groups, Error, Result};

/// Location of the amount due on the payment page
pub const AMOUNT_XPATH: &str = r#"//*[@id="header"]/div/dl[2]/dd/strong"#;

/// Location of the product name on the payment page
pub const PRODUCT_XPATH: &str = r#"//*[@id="header"]/div/dl[1]/dd"#;

/// Copies the text of the first node matching `xpath` to the clipboard
fn copy_xpath_text(xpath: &str) -> String {
    format!(
        "copy(document.evaluate('{xpath}', document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue.innerText);"
    )
}

pub fn find_amount_script() -> String {
    copy_xpath_text(AMOUNT_XPATH)
}

pub fn find_product_script() -> String {
    copy_xpath_text(PRODUCT_XPATH)
}

/// Adds PIN input boxes until the form holds `count`. Returns None when `count` is zero.
pub fn add_pin_boxes_script(count: usize) -> Option<String> {
    if count < 1 {
        return None;
    }
    Some(format!(
        r#"while(document.querySelector("input[name='pyo_cnt']").value < {count}) PinBoxInsert('pyo_cnt');"#
    ))
}

/// Fills every `#pinno` input, in order, with the five-digit groups of `pins`. Returns None when
/// `pins` is empty.
pub fn inject_pins_script(pins: &[String]) -> Option<String> {
    if pins.is_empty() {
        return None;
    }
    let groups: Vec<String> = pins
        .iter()
        .flat_map(|pin| pin_groups(pin))
        .map(|group| format!("'{group}'"))
        .collect();
    Some(format!(
        r##"let i = 0; const arr = [{}]; document.querySelectorAll("#pinno").forEach(obj => {{ obj.querySelectorAll("input").forEach(input => {{ input.value = arr[i++]; }}) }})"##,
        groups.join(", ")
    ))
}

/// Ticks the "agree to all" checkbox
pub fn click_all_agree_script() -> String {
    r##"document.querySelector("#all-agree").click()"##.to_string()
}

pub fn submit_script() -> String {
    "goSubmit(document.form)".to_string()
}

/// Reads an amount as shown on the payment page, i.e., `12,000`
pub fn parse_amount(text: &str) -> Result<u64> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    digits.parse::<u64>().map_err(|e| {
        debug!("Failed to parse amount {text:?}: {e}");
        Error::Automation
    })
}

#[test]
fn inject_script_lists_groups_in_order() {
    let pins = vec![
        "11111-22222-33333-44444".to_string(),
        "55555-66666-77777-88888".to_string(),
    ];
    let script = inject_pins_script(&pins).unwrap();
    assert!(script.contains(
        "['11111', '22222', '33333', '44444', '55555', '66666', '77777', '88888']"
    ));
    assert!(inject_pins_script(&[]).is_none());
}

#[test]
fn selector_scripts_keep_hash_selectors() {
    let pins = vec!["11111-22222-33333-44444".to_string()];
    assert!(inject_pins_script(&pins)
        .unwrap()
        .contains(r##"querySelectorAll("#pinno")"##));
    assert_eq!(
        click_all_agree_script(),
        "document.querySelector(\"#all-agree\").click()"
    );
}

#[test]
fn add_boxes_script() {
    assert!(add_pin_boxes_script(0).is_none());
    assert!(add_pin_boxes_script(3).unwrap().contains("< 3)"));
}

#[test]
fn amount_parsing() {
    assert_eq!(parse_amount(" 12,000 ").unwrap(), 12000);
    assert_eq!(parse_amount("250 000").unwrap(), 250000);
    assert_eq!(parse_amount(""), Err(Error::Automation));
    assert_eq!(parse_amount("free"), Err(Error::Automation));
}

#[test]
fn copy_scripts_name_xpaths() {
    assert!(find_amount_script().starts_with("copy(document.evaluate('//*[@id=\"header\"]/div/dl[2]"));
    assert!(find_product_script().contains(PRODUCT_XPATH));
}
