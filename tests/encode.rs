use utfgrid_renderer::{
    GridEncoder, GridError,
    config::{DedupBy, GridOptions},
    encoder::Layer,
    evaluator::{FieldsEvaluator, TemplateEvaluator},
    serializer::UtfGrid,
    types::{Point, Shape},
};

fn options(resolution: u32, duplicates: bool) -> GridOptions {
    GridOptions {
        resolution,
        duplicates,
        dedup_by: DedupBy::Item,
    }
}

fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + size, y),
        Point::new(x + size, y + size),
        Point::new(x, y + size),
    ]
}

fn feature(x: f64, y: f64, size: f64, code: &str) -> Shape {
    Shape::polygon(vec![square(x, y, size)]).with_field("code", code)
}

#[test]
fn single_polygon_with_sequential_keys() {
    let mut encoder = GridEncoder::new(2, 2, options(1, true)).unwrap();
    encoder
        .start_layer(Layer::new("l", TemplateEvaluator::new(r#"{"code":"[code]"}"#)))
        .unwrap();
    encoder.submit_polygon(&feature(0.0, 0.0, 1.0, "A")).unwrap();
    encoder.end_layer().unwrap();

    assert_eq!(
        encoder.finalize_image().unwrap(),
        r#"{"grid":["! ","  "],"keys":["","1"],"data":{"1":{"code":"A"}}}"#
    );
}

#[test]
fn single_polygon_with_item_keys() {
    let mut encoder = GridEncoder::new(2, 2, options(1, true)).unwrap();
    encoder
        .start_layer(Layer::new("l", FieldsEvaluator::all()).with_item("code"))
        .unwrap();
    encoder.submit_polygon(&feature(0.0, 0.0, 1.0, "A")).unwrap();
    encoder.end_layer().unwrap();
    assert!(encoder.use_item_key());

    assert_eq!(
        encoder.finalize_image().unwrap(),
        r#"{"grid":["! ","  "],"keys":["","A"],"data":{"A":{"code":"A"}}}"#
    );
}

#[test]
fn same_polygon_twice_with_duplicates_keeps_both_records() {
    let mut encoder = GridEncoder::new(2, 2, options(1, true)).unwrap();
    encoder.start_layer(Layer::new("l", FieldsEvaluator::all())).unwrap();
    let first = encoder.submit_polygon(&feature(0.0, 0.0, 1.0, "A")).unwrap();
    let second = encoder.submit_polygon(&feature(0.0, 0.0, 1.0, "A")).unwrap();
    encoder.end_layer().unwrap();
    assert_eq!((first, second), (1, 2));

    let parsed = UtfGrid::parse(&encoder.finalize_image().unwrap()).unwrap();
    // Last paint wins on the grid, but both records are listed.
    assert_eq!(parsed.grid, vec!["# ", "  "]);
    assert_eq!(parsed.keys, vec!["", "1", "2"]);
    assert_eq!(parsed.data.len(), 2);
    assert_eq!(parsed.key_at(0, 0), Some("2"));
}

#[test]
fn deduplication_collapses_identical_item_values() {
    let mut encoder = GridEncoder::new(4, 4, options(1, false)).unwrap();
    encoder
        .start_layer(Layer::new("l", FieldsEvaluator::all()).with_item("code"))
        .unwrap();
    let a = encoder.submit_polygon(&feature(0.0, 0.0, 2.0, "A")).unwrap();
    let b = encoder.submit_polygon(&feature(2.0, 2.0, 2.0, "A")).unwrap();
    encoder.end_layer().unwrap();
    assert_eq!(a, b);
    assert_eq!(encoder.interner().len(), 1);

    let parsed = UtfGrid::parse(&encoder.finalize_image().unwrap()).unwrap();
    assert_eq!(parsed.keys, vec!["", "A"]);
    assert_eq!(parsed.key_at(3, 3), Some("A"));
}

#[test]
fn keys_follow_first_resolution_order_not_paint_order() {
    let mut encoder = GridEncoder::new(3, 1, options(1, false)).unwrap();
    encoder
        .start_layer(Layer::new("l", FieldsEvaluator::all()).with_item("code"))
        .unwrap();
    encoder.submit_polygon(&feature(2.0, 0.0, 1.0, "zeta")).unwrap();
    encoder.submit_polygon(&feature(0.0, 0.0, 1.0, "alpha")).unwrap();
    encoder.submit_polygon(&feature(1.0, 0.0, 1.0, "mid")).unwrap();
    // Repainting an earlier feature does not move its key.
    encoder.submit_polygon(&feature(1.0, 0.0, 1.0, "zeta")).unwrap();
    encoder.end_layer().unwrap();

    let parsed = UtfGrid::parse(&encoder.finalize_image().unwrap()).unwrap();
    assert_eq!(parsed.keys, vec!["zeta", "alpha", "mid"]);
    assert_eq!(parsed.key_at(0, 0), Some("alpha"));
    assert_eq!(parsed.key_at(0, 1), Some("zeta"));
    assert_eq!(parsed.key_at(0, 2), Some("zeta"));
}

#[test]
fn every_cell_decodes_back_to_its_key() {
    // 70 features push ids past both skipped code points.
    let mut encoder = GridEncoder::new(10, 8, options(1, true)).unwrap();
    encoder
        .start_layer(Layer::new("l", FieldsEvaluator::all()).with_item("code"))
        .unwrap();
    let mut expected = Vec::new();
    for i in 0..70u32 {
        let (row, col) = (i / 10, i % 10);
        let code = format!("f{i}");
        encoder
            .submit_polygon(&feature(col as f64, row as f64, 1.0, &code))
            .unwrap();
        expected.push((row as usize, col as usize, code));
    }
    encoder.end_layer().unwrap();

    let json = encoder.finalize_image().unwrap();
    let parsed = UtfGrid::parse(&json).unwrap();
    assert!(parsed.has_water());
    assert_eq!(parsed.keys[0], "");
    for (row, col, code) in expected {
        assert_eq!(parsed.key_at(row, col), Some(code.as_str()));
        assert_eq!(parsed.data_at(row, col).unwrap()["code"], code.as_str());
    }
    assert_eq!(parsed.key_at(7, 9), None);
    assert!(!json.contains('\\'));
}

#[test]
fn water_key_only_when_water_is_present() {
    let mut encoder = GridEncoder::new(4, 4, options(2, true)).unwrap();
    encoder.start_layer(Layer::new("l", FieldsEvaluator::all())).unwrap();
    encoder.submit_polygon(&feature(0.0, 0.0, 4.0, "all")).unwrap();
    encoder.end_layer().unwrap();

    let parsed = UtfGrid::parse(&encoder.finalize_image().unwrap()).unwrap();
    assert_eq!(parsed.grid, vec!["!!", "!!"]);
    assert_eq!(parsed.keys, vec!["1"]);
    assert_eq!(parsed.key_at(1, 1), Some("1"));
}

#[test]
fn lines_use_their_stroke_width() {
    let mut encoder = GridEncoder::new(8, 8, options(2, true)).unwrap();
    encoder.start_layer(Layer::new("roads", FieldsEvaluator::all())).unwrap();
    let road = Shape::line(vec![vec![Point::new(0.5, 3.0), Point::new(7.5, 3.0)]], 1.0)
        .with_field("code", "R1");
    encoder.submit(&road).unwrap();
    encoder.end_layer().unwrap();

    let parsed = UtfGrid::parse(&encoder.finalize_image().unwrap()).unwrap();
    assert_eq!(parsed.grid, vec!["    ", "!!!!", "    ", "    "]);
}

#[test]
fn second_concurrent_layer_aborts() {
    let mut encoder = GridEncoder::new(4, 4, GridOptions::default()).unwrap();
    encoder.start_layer(Layer::new("a", FieldsEvaluator::all())).unwrap();
    let err = encoder
        .start_layer(Layer::new("b", FieldsEvaluator::all()))
        .unwrap_err();
    assert!(matches!(err, GridError::LayerAlreadyActive { .. }));
    assert_eq!(
        err.to_string(),
        "Layer 'b' started while layer 'a' is still active"
    );
}

#[test]
fn streaming_and_string_output_agree() {
    let build = || {
        let mut encoder = GridEncoder::new(6, 3, options(3, true)).unwrap();
        encoder.start_layer(Layer::new("l", FieldsEvaluator::all())).unwrap();
        encoder.submit_polygon(&feature(0.0, 0.0, 3.0, "A")).unwrap();
        encoder.end_layer().unwrap();
        encoder
    };
    let mut streamed = Vec::new();
    build().finalize_to_writer(&mut streamed).unwrap();
    assert_eq!(String::from_utf8(streamed).unwrap(), build().finalize_image().unwrap());
}

#[test]
fn missing_item_field_falls_back_to_an_empty_key() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut encoder = GridEncoder::new(1, 1, options(1, true)).unwrap();
    encoder
        .start_layer(Layer::new("l", FieldsEvaluator::all()).with_item("code"))
        .unwrap();
    let shape = Shape::polygon(vec![square(0.0, 0.0, 1.0)]).with_field("name", "x");
    encoder.submit_polygon(&shape).unwrap();
    encoder.end_layer().unwrap();

    assert_eq!(
        encoder.finalize_image().unwrap(),
        r#"{"grid":["!"],"keys":[""],"data":{"":{"name":"x"}}}"#
    );
}

#[test]
fn template_array_literals_survive_into_the_document() {
    let mut encoder = GridEncoder::new(1, 1, options(1, true)).unwrap();
    encoder
        .start_layer(Layer::new(
            "l",
            TemplateEvaluator::new(r#"{"tags":["fixed"],"code":"[code]"}"#),
        ))
        .unwrap();
    encoder.submit_polygon(&feature(0.0, 0.0, 1.0, "A")).unwrap();
    encoder.end_layer().unwrap();

    let json = encoder.finalize_image().unwrap();
    assert_eq!(
        json,
        r#"{"grid":["!"],"keys":["1"],"data":{"1":{"tags":["fixed"],"code":"A"}}}"#
    );
    let parsed = UtfGrid::parse(&json).unwrap();
    assert_eq!(parsed.data_at(0, 0).unwrap()["tags"][0], "fixed");
}

#[test]
fn oversized_grid_reports_allocation_failure() {
    let result = GridEncoder::new(u32::MAX, u32::MAX, options(1, true));
    assert!(matches!(result, Err(GridError::Allocation(_))));
}
