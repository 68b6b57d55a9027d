use super::*;

#[test]
fn digits_compare_numerically() {
    let mut v = vec!["Shape_10", "Shape_9", "Shape_1", "Brush", "Shape_100"];
    v.sort_by(|a, b| alphanumeric_cmp(a, b));
    assert_eq!(v, ["Brush", "Shape_1", "Shape_9", "Shape_10", "Shape_100"]);
}

#[test]
fn prefix_sorts_first() {
    assert_eq!(alphanumeric_cmp("Ellipse", "Ellipse_0"), Ordering::Less);
    assert_eq!(alphanumeric_cmp("Ellipse_0", "Ellipse"), Ordering::Greater);
}

#[test]
fn order_is_total_for_padded_numbers() {
    assert_ne!(alphanumeric_cmp("a01", "a1"), Ordering::Equal);
    assert_eq!(alphanumeric_cmp("a1", "a1"), Ordering::Equal);
}
