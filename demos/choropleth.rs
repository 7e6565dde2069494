//! Builds a small choropleth grid programmatically and prints the UTFGrid
//! JSON, then a plain preview on stderr.
//!
//! Run with: cargo run --example choropleth

use utfgrid_renderer::{
    GridEncoder,
    config::GridOptions,
    encoder::Layer,
    evaluator::TemplateEvaluator,
    preview::Preview,
    types::{Point, Shape, StrokeStyle},
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
    vec![
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ]
}

fn main() -> anyhow::Result<()> {
    let options = GridOptions {
        resolution: 4,
        duplicates: false,
        ..Default::default()
    };
    let mut encoder = GridEncoder::new(64, 32, options)?;

    // ── Regions, keyed by their ISO code ──────────────
    encoder.start_layer(
        Layer::new(
            "regions",
            TemplateEvaluator::new(r#"{"name":"[NAME]","pop":[POP]}"#),
        )
        .with_item("ISO"),
    )?;
    let regions = [
        (rect(0.0, 0.0, 32.0, 32.0), "NRD", "Nordland", "241000"),
        (rect(32.0, 0.0, 64.0, 16.0), "TRM", "Troms", "167000"),
        (rect(32.0, 16.0, 64.0, 32.0), "FIN", "Finnmark", "75000"),
        // An exclave of the first region; collapses onto its record.
        (rect(48.0, 20.0, 60.0, 28.0), "NRD", "Nordland", "241000"),
    ];
    for (ring, iso, name, pop) in regions {
        let shape = Shape::polygon(vec![ring])
            .with_field("ISO", iso)
            .with_field("NAME", name)
            .with_field("POP", pop);
        encoder.submit_polygon(&shape)?;
        // Outlines do not add records.
        encoder.submit_line(&shape, &StrokeStyle { width: 1.0 })?;
    }
    encoder.end_layer()?;

    // ── A road drawn over the regions ──────────────
    encoder.start_layer(
        Layer::new("roads", TemplateEvaluator::new(r#"{"name":"[NAME]"}"#)).with_item("REF"),
    )?;
    let road = Shape::line(
        vec![vec![Point::new(2.0, 30.0), Point::new(62.0, 2.0)]],
        2.0,
    )
    .with_field("REF", "E6")
    .with_field("NAME", "European route E6");
    encoder.submit(&road)?;
    encoder.end_layer()?;

    Preview::new(encoder.grid(), encoder.interner())
        .plain()
        .render(&mut std::io::stderr())?;

    println!("{}", encoder.finalize_image()?);
    Ok(())
}
