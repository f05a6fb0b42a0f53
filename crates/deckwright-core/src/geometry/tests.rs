use proptest::prelude::*;
use rstest::{fixture, rstest};
use strum::IntoEnumIterator;

use super::*;

const EPSILON: f64 = 1e-9;

#[fixture]
fn resolver() -> CoordinateResolver {
    CoordinateResolver::new(Canvas::STANDARD)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[rstest]
#[case("2in", Length::inches(2.0))]
#[case("18pt", Length::points(18.0))]
#[case(" 2.54 CM ", Length::new(2.54, Unit::Cm))]
#[case("914400emu", Length::new(914_400.0, Unit::Emu))]
#[case("-1.5", Length::inches(-1.5))]
fn parses_lengths(#[case] input: &str, #[case] expected: Length) {
    assert_eq!(input.parse::<Length>(), Ok(expected));
}

#[rstest]
#[case("")]
#[case("two inches")]
#[case("3px")]
#[case("inf")]
fn rejects_bad_lengths(#[case] input: &str) {
    assert!(input.parse::<Length>().is_err());
}

#[rstest]
#[case(Length::inches(1.0), 1.0)]
#[case(Length::points(72.0), 1.0)]
#[case(Length::new(2.54, Unit::Cm), 1.0)]
#[case(Length::new(914_400.0, Unit::Emu), 1.0)]
fn converts_units_to_inches(#[case] length: Length, #[case] inches: f64) {
    assert!(close(length.to_inches(), inches));
}

#[test]
fn lengths_accept_numbers_and_strings_in_json() {
    let spec: PositionSpec =
        serde_json::from_str(r#"{"type":"absolute","left":1.5,"top":"36pt"}"#).expect("parse");
    assert_eq!(
        spec,
        PositionSpec::Absolute {
            left: Length::inches(1.5),
            top: Length::points(36.0),
        }
    );
}

#[rstest]
#[case(0.0, 7.5)]
#[case(10.0, -1.0)]
#[case(f64::NAN, 1.0)]
fn canvas_rejects_degenerate_dimensions(#[case] width: f64, #[case] height: f64) {
    assert!(matches!(
        Canvas::new(width, height),
        Err(CoordinateError::InvalidCanvas { .. })
    ));
}

#[rstest]
fn percentage_scales_canvas(resolver: CoordinateResolver) {
    let resolved = resolver
        .resolve(&PositionSpec::Percentage {
            left: 50.0,
            top: 20.0,
        })
        .expect("resolve");
    assert_eq!(resolved.value, Point::new(5.0, 1.5));
    assert!(resolved.warnings.is_empty());
}

#[rstest]
fn percentage_beyond_canvas_warns_unless_allowed(resolver: CoordinateResolver) {
    let spec = PositionSpec::Percentage {
        left: 120.0,
        top: -5.0,
    };
    let warned = resolver.resolve(&spec).expect("resolve");
    assert_eq!(warned.warnings.len(), 1);
    assert!(matches!(
        warned.warnings.first(),
        Some(CoordinateWarning::PointOffCanvas { .. })
    ));

    let allowed = resolver.allow_offcanvas(true).resolve(&spec).expect("resolve");
    assert!(allowed.warnings.is_empty());
    assert_eq!(allowed.value, warned.value);
}

#[rstest]
fn absolute_converts_units(resolver: CoordinateResolver) {
    let resolved = resolver
        .resolve(&PositionSpec::Absolute {
            left: Length::points(144.0),
            top: Length::new(2.54, Unit::Cm),
        })
        .expect("resolve");
    assert!(close(resolved.value.x, 2.0));
    assert!(close(resolved.value.y, 1.0));
}

#[rstest]
#[case(Anchor::TopLeft, Point::new(0.0, 0.0))]
#[case(Anchor::TopCenter, Point::new(5.0, 0.0))]
#[case(Anchor::Center, Point::new(5.0, 3.75))]
#[case(Anchor::MiddleRight, Point::new(10.0, 3.75))]
#[case(Anchor::BottomRight, Point::new(10.0, 7.5))]
fn anchors_map_to_canvas_points(#[case] anchor: Anchor, #[case] expected: Point) {
    assert_eq!(anchor.point_on(Canvas::STANDARD), expected);
}

#[rstest]
fn grid_selects_cell_top_left(resolver: CoordinateResolver) {
    let resolved = resolver
        .resolve(&PositionSpec::Grid {
            row: 1,
            col: 3,
            grid_size: 4,
        })
        .expect("resolve");
    assert!(close(resolved.value.x, 7.5));
    assert!(close(resolved.value.y, 1.875));
}

#[rstest]
#[case(0, 0, 0, CoordinateError::EmptyGrid)]
#[case(4, 0, 4, CoordinateError::CellOutOfRange { row: 4, col: 0, grid_size: 4 })]
#[case(0, 9, 3, CoordinateError::CellOutOfRange { row: 0, col: 9, grid_size: 3 })]
fn grid_rejects_impossible_cells(
    resolver: CoordinateResolver,
    #[case] row: u32,
    #[case] col: u32,
    #[case] grid_size: u32,
    #[case] expected: CoordinateError,
) {
    let error = resolver
        .resolve(&PositionSpec::Grid {
            row,
            col,
            grid_size,
        })
        .expect_err("invalid cell");
    assert_eq!(error, expected);
}

#[rstest]
fn non_finite_percentage_is_an_error(resolver: CoordinateResolver) {
    let error = resolver
        .resolve(&PositionSpec::Percentage {
            left: f64::INFINITY,
            top: 0.0,
        })
        .expect_err("infinite input");
    assert_eq!(error, CoordinateError::NonFinite { field: "left" });
}

#[rstest]
fn bottom_right_anchor_pins_shape_corner(resolver: CoordinateResolver) {
    let frame = resolver
        .resolve_frame(
            &PositionSpec::Anchor {
                point: Anchor::BottomRight,
                offset_x: Length::inches(-1.0),
                offset_y: Length::inches(-0.5),
            },
            &SizeSpec::inches(2.0, 1.0),
            None,
        )
        .expect("resolve frame");
    assert!(close(frame.value.left, 7.0), "left was {}", frame.value.left);
    assert!(close(frame.value.top, 6.0), "top was {}", frame.value.top);
    assert!(frame.warnings.is_empty());
}

#[rstest]
fn frame_past_the_edge_warns(resolver: CoordinateResolver) {
    let frame = resolver
        .resolve_frame(
            &PositionSpec::Percentage {
                left: 90.0,
                top: 0.0,
            },
            &SizeSpec::inches(3.0, 1.0),
            None,
        )
        .expect("resolve frame");
    assert!(matches!(
        frame.warnings.as_slice(),
        [CoordinateWarning::FrameOffCanvas { .. }]
    ));
}

#[rstest]
#[case("50%", Dimension::Percent(50.0))]
#[case("auto", Dimension::Auto)]
#[case("AUTO", Dimension::Auto)]
#[case("3cm", Dimension::Length(Length::new(3.0, Unit::Cm)))]
fn parses_dimensions(#[case] input: &str, #[case] expected: Dimension) {
    assert_eq!(input.parse::<Dimension>(), Ok(expected));
}

#[rstest]
fn size_percentages_follow_their_axis(resolver: CoordinateResolver) {
    let extent = resolver
        .resolve_size(
            &SizeSpec {
                width: Dimension::Percent(50.0),
                height: Dimension::Percent(20.0),
            },
            None,
        )
        .expect("resolve size");
    assert_eq!(extent, Extent::new(5.0, 1.5));
}

#[rstest]
fn auto_dimension_preserves_aspect_ratio(resolver: CoordinateResolver) {
    let intrinsic = Some(Extent::new(1600.0 / 96.0, 900.0 / 96.0));
    let extent = resolver
        .resolve_size(
            &SizeSpec {
                width: Dimension::Length(Length::inches(4.0)),
                height: Dimension::Auto,
            },
            intrinsic,
        )
        .expect("resolve size");
    assert!(close(extent.height, 2.25));

    let extent = resolver
        .resolve_size(
            &SizeSpec {
                width: Dimension::Auto,
                height: Dimension::Length(Length::inches(2.25)),
            },
            intrinsic,
        )
        .expect("resolve size");
    assert!(close(extent.width, 4.0));
}

#[rstest]
#[case(Dimension::Auto, Dimension::Auto, None, CoordinateError::BothAuto)]
#[case(
    Dimension::Auto,
    Dimension::Percent(10.0),
    None,
    CoordinateError::MissingIntrinsic { dimension: "width" }
)]
#[case(
    Dimension::Length(Length::inches(0.0)),
    Dimension::Percent(10.0),
    None,
    CoordinateError::DegenerateSize { dimension: "width", value: 0.0 }
)]
#[case(
    Dimension::Percent(10.0),
    Dimension::Length(Length::inches(-2.0)),
    None,
    CoordinateError::DegenerateSize { dimension: "height", value: -2.0 }
)]
fn degenerate_sizes_are_hard_errors(
    resolver: CoordinateResolver,
    #[case] width: Dimension,
    #[case] height: Dimension,
    #[case] intrinsic: Option<Extent>,
    #[case] expected: CoordinateError,
) {
    let error = resolver
        .resolve_size(&SizeSpec { width, height }, intrinsic)
        .expect_err("degenerate size");
    assert_eq!(error, expected);
}

#[test]
fn nan_size_is_degenerate() {
    let error = CoordinateResolver::new(Canvas::STANDARD)
        .resolve_size(
            &SizeSpec {
                width: Dimension::Percent(f64::NAN),
                height: Dimension::Percent(10.0),
            },
            None,
        )
        .expect_err("nan size");
    assert!(matches!(
        error,
        CoordinateError::DegenerateSize { dimension: "width", .. }
    ));
}

fn unit() -> impl Strategy<Value = Unit> {
    prop_oneof![Just(Unit::In), Just(Unit::Pt), Just(Unit::Cm), Just(Unit::Emu)]
}

fn anchor() -> impl Strategy<Value = Anchor> {
    prop::sample::select(Anchor::iter().collect::<Vec<_>>())
}

fn position_spec() -> impl Strategy<Value = PositionSpec> {
    prop_oneof![
        (0.0..=100.0_f64, 0.0..=100.0_f64)
            .prop_map(|(left, top)| PositionSpec::Percentage { left, top }),
        (-20.0..20.0_f64, -20.0..20.0_f64, unit(), unit()).prop_map(|(x, y, ux, uy)| {
            PositionSpec::Absolute {
                left: Length::from_inches(x, ux),
                top: Length::from_inches(y, uy),
            }
        }),
        (anchor(), -5.0..5.0_f64, -5.0..5.0_f64, unit()).prop_map(|(point, dx, dy, u)| {
            PositionSpec::Anchor {
                point,
                offset_x: Length::from_inches(dx, u),
                offset_y: Length::from_inches(dy, u),
            }
        }),
        (1_u32..24)
            .prop_flat_map(|size| (0..size, 0..size, Just(size)))
            .prop_map(|(row, col, grid_size)| PositionSpec::Grid {
                row,
                col,
                grid_size,
            }),
    ]
}

fn specs_match(a: &PositionSpec, b: &PositionSpec) -> bool {
    let length_close = |x: Length, y: Length| {
        x.unit == y.unit && (x.value - y.value).abs() <= 1e-6 * x.value.abs().max(1.0)
    };
    match (a, b) {
        (
            PositionSpec::Percentage { left, top },
            PositionSpec::Percentage {
                left: left2,
                top: top2,
            },
        ) => close(*left, *left2) && close(*top, *top2),
        (
            PositionSpec::Absolute { left, top },
            PositionSpec::Absolute {
                left: left2,
                top: top2,
            },
        ) => length_close(*left, *left2) && length_close(*top, *top2),
        (
            PositionSpec::Anchor {
                point,
                offset_x,
                offset_y,
            },
            PositionSpec::Anchor {
                point: point2,
                offset_x: ox2,
                offset_y: oy2,
            },
        ) => point == point2 && length_close(*offset_x, *ox2) && length_close(*offset_y, *oy2),
        (grid @ PositionSpec::Grid { .. }, other @ PositionSpec::Grid { .. }) => grid == other,
        _ => false,
    }
}

proptest! {
    #[test]
    fn percentage_is_linear_in_each_axis(left in 0.0..=100.0_f64, top in 0.0..=100.0_f64) {
        let point = CoordinateResolver::new(Canvas::STANDARD)
            .resolve(&PositionSpec::Percentage { left, top })
            .expect("resolve")
            .value;
        prop_assert!((point.x - left * 0.1).abs() < EPSILON);
        prop_assert!((point.y - top * 0.075).abs() < EPSILON);
    }

    #[test]
    fn percentage_is_monotonic(
        a in 0.0..=100.0_f64,
        b in 0.0..=100.0_f64,
        fixed in 0.0..=100.0_f64
    ) {
        let resolver = CoordinateResolver::new(Canvas::STANDARD);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let resolve = |left, top| {
            resolver
                .resolve(&PositionSpec::Percentage { left, top })
                .expect("resolve")
                .value
        };
        let x = |left| resolve(left, fixed).x;
        let y = |top| resolve(fixed, top).y;
        prop_assert!(x(low) <= x(high));
        prop_assert!(y(low) <= y(high));
    }

    #[test]
    fn resolving_then_reexpressing_round_trips(spec in position_spec()) {
        let resolver = CoordinateResolver::new(Canvas::STANDARD).allow_offcanvas(true);
        let point = resolver.resolve(&spec).expect("resolve").value;
        let back = resolver.reexpress(&spec, point).expect("reexpress");
        prop_assert!(specs_match(&spec, &back), "{spec:?} came back as {back:?}");
    }
}
