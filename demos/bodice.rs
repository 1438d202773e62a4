//! Drafts the outline of a simple back bodice block and prints the result.
//!
//! Run with `RUST_LOG=seamline=debug` to watch the evaluation pass.

use seamline::{
    AlongLinePoint, AxisIntersectionPoint, CalculationDescriptor, CalculationGraph, Curve,
    EndLinePoint, Geometry, Line, LineStyle, MeasurementDescriptor, NormalPoint, Presentation,
    SinglePoint,
};

fn step(graph: &mut CalculationGraph, name: &str, descriptor: CalculationDescriptor) -> miette::Result<()> {
    graph.add(descriptor.named(name))?;
    Ok(())
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut graph = CalculationGraph::new();
    graph.add_measurement(MeasurementDescriptor::new("bust", "92"))?;
    graph.add_measurement(MeasurementDescriptor::new("waist", "72"))?;
    graph.add_measurement(MeasurementDescriptor::new("back_length", "41"))?;
    graph.add_measurement(MeasurementDescriptor::new("@ease", "bust * 0.04"))?;

    // Steps are added out of order on purpose; the graph sorts them.
    step(
        &mut graph,
        "G",
        CalculationDescriptor::new(AlongLinePoint::new("D", "F", "Line_A_C / 2")),
    )?;
    step(&mut graph, "A", CalculationDescriptor::new(SinglePoint::at(0.0, 0.0)))?;
    step(
        &mut graph,
        "B",
        CalculationDescriptor::new(EndLinePoint::new("A", "270", "back_length")),
    )?;
    step(
        &mut graph,
        "C",
        CalculationDescriptor::new(EndLinePoint::new("A", "0", "(bust + @ease) / 4")),
    )?;
    step(
        &mut graph,
        "D",
        CalculationDescriptor::new(AlongLinePoint::new("A", "B", "CurrentLength / 2")),
    )?;
    step(
        &mut graph,
        "E",
        CalculationDescriptor::new(NormalPoint::new("B", "A", "(waist + @ease) / 4").with_angle("180")),
    )?;
    step(&mut graph, "F", CalculationDescriptor::new(AxisIntersectionPoint::new("C", "D")))?;

    graph.add(CalculationDescriptor::new(Line::new("A", "B")))?;
    graph.add(CalculationDescriptor::new(Line::new("A", "C")))?;
    graph.add(
        CalculationDescriptor::new(Line::new("D", "F")).with_presentation(Presentation {
            line_style: LineStyle::DashLine,
            ..Presentation::default()
        }),
    )?;
    graph.add(CalculationDescriptor::new(Curve::new(
        "E",
        "F",
        ("90", "back_length / 6"),
        ("270", "4"),
    )))?;

    graph.evaluate_all()?;

    println!("measurements:");
    for measurement in graph.measurements() {
        if let Some(value) = measurement.value() {
            println!("  {:<12} {value:>8.2}", measurement.display_name());
        }
    }

    println!("construction:");
    for node in graph.nodes() {
        match node.geometry() {
            Some(Geometry::Point(p)) => {
                println!("  {:<12} ({:>7.2}, {:>7.2})", node.label(), p.x(), p.y())
            }
            Some(Geometry::Line(segment)) => {
                println!("  {:<12} length {:.2}", node.label(), segment.length())
            }
            Some(Geometry::Curve(curve)) => {
                println!("  {:<12} length {:.2}", node.label(), curve.length())
            }
            None => println!("  {:<12} not evaluated", node.label()),
        }
    }

    let bbox = graph.bounding_box();
    println!("extent: {:.2} x {:.2}", bbox.width(), bbox.height());
    Ok(())
}
