//! End-to-end edits through the crate-level functions.

use exml_edit::{
    Dialect, StateEditor, add_namespace, clean_namespace, create_new_state, find_item_by_path,
    find_path_at_pos, find_range_by_path, format_indent, remove_state,
};
use exml_tree::{Namespace, Span, parse};

const SKIN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<e:Skin class="skins.ButtonSkin" states="up,down,disabled" xmlns:e="http://ns.egret.com/eui" xmlns:w="http://ns.egret.com/wing">
    <w:Declarations>
        <e:Rect includeIn="down"/>
    </w:Declarations>
    <!-- background -->
    <e:Image width="100%" height="100%" source="button_up_png" source.down="button_down_png"/>
    <e:Label id="labelDisplay" horizontalCenter="0" verticalCenter="0" excludeFrom="disabled"/>
    <e:Group includeIn="disabled">
        <e:Image source="lock_png"/>
    </e:Group>
</e:Skin>"#;

#[test]
fn test_blank_state_scenario() {
    let text = r#"<Skin xmlns:e="ns" states="normal"><Rect id="bg" excludeFrom="normal"/></Skin>"#;
    let result = create_new_state(text, &["normal"], "hover", None);
    assert!(result.fully_succeeded);
    let root = parse(&result.text).unwrap();
    assert_eq!(root.get_attribute("states"), Some("normal,hover"));
    let rect = root.tags().next().unwrap();
    assert_eq!(rect.get_attribute("excludeFrom"), Some("normal,hover"));
    assert!(!rect.has_attribute("includeIn"));
}

#[test]
fn test_range_scenario() {
    let range = find_range_by_path("<a><b/><c/></a>", &[0, 1], None, &[]);
    assert_eq!(range.head, Some(Span::new(7, 11)));
}

#[test]
fn test_selection_round_trip_in_state() {
    let states = ["up", "down", "disabled"];
    let lock = SKIN.find("lock_png").unwrap();
    assert!(find_path_at_pos(SKIN, lock, Some("up"), &states).is_empty());

    let path = find_path_at_pos(SKIN, lock, Some("disabled"), &states);
    // Declarations, the first image and the group; the label is hidden.
    assert_eq!(path, vec![0, 2, 0]);
    let range = find_range_by_path(SKIN, &path, Some("disabled"), &states);
    let head = range.head.unwrap();
    assert_eq!(&SKIN[head.start..head.end], r#"<e:Image source="lock_png"/>"#);

    let root = parse(SKIN).unwrap();
    let item = find_item_by_path(&root, &path, Some("disabled"), &states).unwrap();
    assert_eq!(item.get_attribute("source"), Some("lock_png"));
}

#[test]
fn test_declarations_count_as_children() {
    let states = ["up", "down", "disabled"];
    let label = SKIN.find("labelDisplay").unwrap();
    let path = find_path_at_pos(SKIN, label, Some("up"), &states);
    // Declarations, the image, then the label.
    assert_eq!(path, vec![0, 2]);
}

#[test]
fn test_remove_state_keeps_comments_and_declarations() {
    let result = remove_state(SKIN, "disabled", &["up", "down", "disabled"]);
    assert!(result.fully_succeeded);
    insta::assert_snapshot!(result.text, @r#"
    <?xml version="1.0" encoding="utf-8"?>
    <e:Skin class="skins.ButtonSkin" states="up,down" xmlns:e="http://ns.egret.com/eui" xmlns:w="http://ns.egret.com/wing">
        <w:Declarations>
            <e:Rect includeIn="down"/>
        </w:Declarations>
        <!-- background -->
        <e:Image width="100%" height="100%" source="button_up_png" source.down="button_down_png"/>
        <e:Label id="labelDisplay" horizontalCenter="0" verticalCenter="0"/>
    </e:Skin>
    "#);
}

#[test]
fn test_namespace_housekeeping() {
    let added = add_namespace(SKIN, &Namespace::new("ns1", "*"));
    assert!(added.added.is_some());
    let cleaned = clean_namespace(&added.result.text);
    assert_eq!(cleaned.text, SKIN);
}

#[test]
fn test_format_after_edit() {
    let text = "<e:Skin xmlns:e=\"u\">\n<e:Group>\n<e:Label/>\n</e:Group>\n</e:Skin>";
    let result = format_indent(text, 0, text.len());
    assert_eq!(
        result.text,
        "<e:Skin xmlns:e=\"u\">\n\t<e:Group>\n\t\t<e:Label/>\n\t</e:Group>\n</e:Skin>"
    );
}

#[test]
fn test_custom_dialect() {
    let editor = StateEditor::new(Dialect::default().with_working_prefix("d"));
    let text = r#"<Skin><d:Note/><w:Tool/></Skin>"#;
    let result = editor.create_new_state(text, &["a"], "b", None);
    assert_eq!(
        result.text,
        r#"<Skin states="b"><d:Note/><w:Tool includeIn="a"/></Skin>"#
    );
}

#[test]
fn test_multibyte_labels() {
    let text = "<e:Skin xmlns:e=\"u\" states=\"up,down\">\n<e:Label text=\"确定\" text.down=\"取消\"/>\n<e:Label>标签</e:Label>\n</e:Skin>";
    let states = ["up", "down"];
    let inside = text.find("签").unwrap() + 1;
    assert_eq!(find_path_at_pos(text, inside, Some("up"), &states), vec![0, 1]);

    let created = create_new_state(text, &states, "over", Some("down"));
    assert!(created.fully_succeeded);
    assert!(created.text.contains("text.over=\"取消\""));

    let tail = format_indent(text, inside, text.len());
    assert!(tail.fully_succeeded);
    assert_eq!(tail.text, text);

    let formatted = format_indent(text, 0, text.len());
    assert!(formatted.text.ends_with("\n\t<e:Label>标签</e:Label>\n</e:Skin>"));
}
