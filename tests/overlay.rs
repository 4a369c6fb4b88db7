use std::{
    cell::Cell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use creditmark::{
    BoundingBox, CanvasSurface, ColorDef, CreditmarkResult, CreditsOverlay, CreditsOverride,
    DrawFn, FontAsset, ImageRef, OverlayDefaults, OverlayOutcome, Rect, TextAlign, TextMetrics,
    VariantStore,
};

struct FixedMetrics {
    bbox: BoundingBox,
    calls: Rc<Cell<usize>>,
}

impl TextMetrics for FixedMetrics {
    fn measure(
        &mut self,
        _caption: &str,
        _font: &FontAsset,
        _size_px: u32,
    ) -> CreditmarkResult<BoundingBox> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.bbox)
    }
}

#[derive(Default)]
struct RecordedDraw {
    fills: Vec<(Rect, ColorDef)>,
    texts: Vec<(String, i32, i32, TextAlign)>,
}

#[derive(Default)]
struct RecordingSurface {
    draw: RecordedDraw,
}

impl CanvasSurface for RecordingSurface {
    fn fill_rect(&mut self, rect: Rect, color: ColorDef) -> CreditmarkResult<()> {
        self.draw.fills.push((rect, color));
        Ok(())
    }

    fn draw_text(
        &mut self,
        caption: &str,
        x: i32,
        y: i32,
        align: TextAlign,
        _font: &FontAsset,
        _size_px: u32,
        _color: ColorDef,
    ) -> CreditmarkResult<()> {
        self.draw.texts.push((caption.to_owned(), x, y, align));
        Ok(())
    }
}

/// In-memory stand-in for the external variant store. Replays cached variants
/// without invoking the draw callback, like the real store would.
#[derive(Default)]
struct MemoryStore {
    variants: HashMap<String, ImageRef>,
    draws: BTreeMap<String, RecordedDraw>,
    manipulate_calls: usize,
    draw_calls: usize,
    unavailable: bool,
}

impl VariantStore for MemoryStore {
    fn manipulate(
        &mut self,
        image: &ImageRef,
        variant: &str,
        draw: &mut DrawFn<'_>,
    ) -> CreditmarkResult<Option<ImageRef>> {
        self.manipulate_calls += 1;
        if self.unavailable {
            return Ok(None);
        }
        if let Some(cached) = self.variants.get(variant) {
            return Ok(Some(cached.clone()));
        }

        self.draw_calls += 1;
        let mut surface = RecordingSurface::default();
        draw(&mut surface)?;
        self.draws.insert(variant.to_owned(), surface.draw);

        let variant_ref = ImageRef {
            key: format!("{}__{variant}", image.key),
            width: image.width,
            height: image.height,
            exists: true,
        };
        self.variants.insert(variant.to_owned(), variant_ref.clone());
        Ok(Some(variant_ref))
    }
}

fn test_image() -> ImageRef {
    ImageRef {
        key: "photos/holiday.png".to_owned(),
        width: 800,
        height: 600,
        exists: true,
    }
}

fn overlay_with(
    bbox: BoundingBox,
    calls: &Rc<Cell<usize>>,
) -> CreditsOverlay<FixedMetrics> {
    CreditsOverlay::new(
        OverlayDefaults::default(),
        FontAsset::from_bytes("fonts/test.ttf", vec![0u8; 4]),
        FixedMetrics {
            bbox,
            calls: calls.clone(),
        },
    )
}

const BBOX: BoundingBox = BoundingBox {
    width: 120,
    height: 20,
};

#[test]
fn empty_caption_passes_through_without_collaborator_calls() {
    let calls = Rc::new(Cell::new(0));
    let mut overlay = overlay_with(BBOX, &calls);
    let mut store = MemoryStore::default();
    let image = test_image();

    for caption in [None, Some("")] {
        let outcome = overlay.apply(&mut store, &image, caption, None).unwrap();
        assert_eq!(outcome, OverlayOutcome::Unchanged(image.clone()));
    }

    assert_eq!(calls.get(), 0);
    assert_eq!(store.manipulate_calls, 0);
}

#[test]
fn missing_image_passes_through_without_collaborator_calls() {
    let calls = Rc::new(Cell::new(0));
    let mut overlay = overlay_with(BBOX, &calls);
    let mut store = MemoryStore::default();
    let image = ImageRef {
        exists: false,
        ..test_image()
    };

    let outcome = overlay
        .apply(&mut store, &image, Some("photo: jane"), None)
        .unwrap();
    assert_eq!(outcome, OverlayOutcome::Unchanged(image));
    assert_eq!(calls.get(), 0);
    assert_eq!(store.manipulate_calls, 0);
}

#[test]
fn draws_background_box_then_caption_at_bottom_right() {
    let calls = Rc::new(Cell::new(0));
    let mut overlay = overlay_with(BBOX, &calls);
    let mut store = MemoryStore::default();

    let outcome = overlay
        .apply(&mut store, &test_image(), Some("photo: jane"), None)
        .unwrap();
    let OverlayOutcome::Variant(variant) = outcome else {
        panic!("expected a rendered variant");
    };
    assert!(variant.exists);
    assert_eq!(calls.get(), 1);

    let draw = store.draws.values().next().unwrap();
    assert_eq!(
        draw.fills,
        vec![(
            Rect {
                x1: 660,
                y1: 560,
                x2: 800,
                y2: 600
            },
            ColorDef::rgba(255, 255, 255, 179)
        )]
    );
    assert_eq!(
        draw.texts,
        vec![("photo: jane".to_owned(), 790, 590, TextAlign::Right)]
    );
}

#[test]
fn position_override_moves_the_anchor() {
    let calls = Rc::new(Cell::new(0));
    let mut overlay = overlay_with(BBOX, &calls);
    let mut store = MemoryStore::default();
    let override_ = CreditsOverride::from_json(r#"{"Position": "bottom_left"}"#).unwrap();

    overlay
        .apply(&mut store, &test_image(), Some("c"), Some(&override_))
        .unwrap();

    let draw = store.draws.values().next().unwrap();
    assert_eq!(draw.texts, vec![("c".to_owned(), 10, 590, TextAlign::Left)]);
    assert_eq!(
        draw.fills[0].0,
        Rect {
            x1: 0,
            y1: 560,
            x2: 140,
            y2: 600
        }
    );
}

#[test]
fn zero_bounding_box_skips_the_background_draw() {
    let calls = Rc::new(Cell::new(0));
    let mut overlay = overlay_with(BoundingBox::default(), &calls);
    let mut store = MemoryStore::default();

    overlay
        .apply(&mut store, &test_image(), Some("c"), None)
        .unwrap();

    let draw = store.draws.values().next().unwrap();
    assert!(draw.fills.is_empty());
    assert_eq!(draw.texts.len(), 1);
    assert_eq!((draw.texts[0].1, draw.texts[0].2), (790, 590));
}

#[test]
fn store_without_drawable_raster_yields_unavailable() {
    let calls = Rc::new(Cell::new(0));
    let mut overlay = overlay_with(BBOX, &calls);
    let mut store = MemoryStore {
        unavailable: true,
        ..Default::default()
    };

    let outcome = overlay
        .apply(&mut store, &test_image(), Some("c"), None)
        .unwrap();
    assert_eq!(outcome, OverlayOutcome::Unavailable);
}

#[test]
fn identical_input_renders_at_most_once() {
    let calls = Rc::new(Cell::new(0));
    let mut overlay = overlay_with(BBOX, &calls);
    let mut store = MemoryStore::default();
    let image = test_image();

    let first = overlay
        .apply(&mut store, &image, Some("photo: jane"), None)
        .unwrap();
    let second = overlay
        .apply(&mut store, &image, Some("photo: jane"), None)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.manipulate_calls, 2);
    assert_eq!(store.draw_calls, 1);
}

#[test]
fn changed_settings_produce_a_distinct_variant() {
    let calls = Rc::new(Cell::new(0));
    let mut overlay = overlay_with(BBOX, &calls);
    let mut store = MemoryStore::default();
    let image = test_image();
    let override_ = CreditsOverride::from_json(r#"{"FontSize": 48}"#).unwrap();

    overlay.apply(&mut store, &image, Some("c"), None).unwrap();
    overlay
        .apply(&mut store, &image, Some("c"), Some(&override_))
        .unwrap();

    assert_eq!(store.variants.len(), 2);
    assert_eq!(store.draw_calls, 2);
}
