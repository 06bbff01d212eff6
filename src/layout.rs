//! Page layout calculations

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Create a length from points (1/72 inch)
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * 25.4 / 72.0)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }

    /// Get the value in twentieths of a point (WordprocessingML page units)
    pub fn twips(&self) -> i64 {
        (self.pt() * 20.0).round() as i64
    }

    /// Get the value in English Metric Units (DrawingML extents)
    pub fn emu(&self) -> i64 {
        (self.0 / 25.4 * 914_400.0).round() as i64
    }
}

/// Geometry of one PDF page, taken from its MediaBox
///
/// The origin is kept because some producers emit boxes that do not start
/// at `0 0`; everything drawn on the page is offset by it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub x0: f32,
    pub y0: f32,
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    /// Build from a `[llx lly urx ury]` MediaBox
    pub fn from_media_box(media_box: [f32; 4]) -> Self {
        let [llx, lly, urx, ury] = media_box;
        Self {
            x0: llx.min(urx),
            y0: lly.min(ury),
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
        }
    }

    /// US Letter (8.5" × 11")
    pub fn letter() -> Self {
        Self::from_media_box([0.0, 0.0, 612.0, 792.0])
    }

    /// The MediaBox this geometry was read from
    pub fn media_box(&self) -> [f32; 4] {
        [self.x0, self.y0, self.x0 + self.width, self.y0 + self.height]
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    pub fn width_length(&self) -> Length {
        Length::from_pt(self.width as f64)
    }

    pub fn height_length(&self) -> Length {
        Length::from_pt(self.height as f64)
    }
}

/// Anchor points of the branded header and footer on one page
///
/// All coordinates are absolute PDF user-space values (origin at the
/// bottom-left of the MediaBox).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrandAnchors {
    /// Left edge of header content
    pub left: f32,
    /// Right edge of header and footer content
    pub right: f32,
    /// Header reference line, half an inch below the top edge
    pub top: f32,
    /// Baseline of the firm name and contact line
    pub text_baseline: f32,
    /// Y of the gold rule
    pub rule_y: f32,
    /// Baseline of the first-page title
    pub title_baseline: f32,
    /// Baseline of the page label
    pub footer_baseline: f32,
    /// Bottom of the logo
    pub logo_bottom: f32,
    /// Horizontal start of the firm name
    pub brand_text_left: f32,
}

/// Horizontal padding of header and footer content
pub const SIDE_PADDING: Length = Length(0.7 * 25.4);
/// Distance from the top edge to the header reference line
pub const HEADER_OFFSET: Length = Length(0.5 * 25.4);
/// Footer baseline height above the bottom edge
pub const FOOTER_BASELINE: Length = Length(0.45 * 25.4);

/// Calculate header/footer anchors for a page
pub fn brand_anchors(page: &PageGeometry) -> BrandAnchors {
    let pad = SIDE_PADDING.pt() as f32;
    let top = page.y0 + page.height - HEADER_OFFSET.pt() as f32;
    let left = page.x0 + pad;

    BrandAnchors {
        left,
        right: page.x0 + page.width - pad,
        top,
        text_baseline: top - 6.0,
        rule_y: top - 16.0,
        title_baseline: top - 36.0,
        footer_baseline: page.y0 + FOOTER_BASELINE.pt() as f32,
        logo_bottom: top - 18.0,
        brand_text_left: left + 28.0,
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Margins {
    /// Create margins with same value on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }

    /// Standard 1-inch margins on all sides
    pub fn standard() -> Self {
        Self::uniform(Length::from_inches(1.0))
    }

    /// Header/footer distance from the page edge in converted documents
    pub fn header_distance() -> Length {
        Length::from_inches(0.5)
    }
}
