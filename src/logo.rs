//! Brand logo loading and rasterization
//!
//! The logo is cosmetic. Callers are expected to treat every error from
//! this module as "brand without a logo" rather than aborting the run.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use log::{debug, info, warn};
use resvg::{tiny_skia, usvg};

use crate::error::{Error, Result};

/// What [`ensure_png`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoStatus {
    /// The PNG already existed and was left alone
    Cached,
    /// The PNG was rendered from the SVG
    Written,
    /// There is no SVG to render from
    SourceMissing,
}

/// A rasterized logo with straight (non-premultiplied) RGBA pixels
#[derive(Debug, Clone)]
pub struct RasterLogo {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl RasterLogo {
    /// Width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// RGB samples without alpha, row-major
    pub fn rgb(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect()
    }

    /// Alpha samples, row-major
    pub fn alpha(&self) -> Vec<u8> {
        self.rgba.chunks_exact(4).map(|px| px[3]).collect()
    }

    /// Whether any pixel is not fully opaque
    pub fn has_transparency(&self) -> bool {
        self.rgba.chunks_exact(4).any(|px| px[3] != 255)
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let img = RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .ok_or_else(|| Error::Logo("pixel buffer does not match dimensions".to_string()))?;

        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}

/// Whether the SVG source holds `<text>` elements
///
/// resvg is built without its text feature, so such elements parse but
/// draw nothing. Logos should have their lettering converted to paths.
pub fn has_text_elements(data: &[u8]) -> bool {
    let Ok(source) = std::str::from_utf8(data) else {
        return false;
    };
    roxmltree::Document::parse(source)
        .map(|doc| doc.descendants().any(|n| n.is_element() && n.tag_name().name() == "text"))
        .unwrap_or(false)
}

/// Parse an SVG file
pub fn load_svg(path: &Path) -> Result<usvg::Tree> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let data = fs::read(path)?;
    if has_text_elements(&data) {
        warn!("{} contains <text>; it will not be drawn, convert it to paths", path.display());
    }
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_data(&data, &options)?;
    Ok(tree)
}

/// Render an SVG tree at `height_px` pixels tall, keeping its aspect ratio
pub fn rasterize(tree: &usvg::Tree, height_px: u32) -> Result<RasterLogo> {
    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(Error::Logo("SVG has an empty viewport".to_string()));
    }

    let scale = height_px.max(1) as f32 / size.height();
    let width = (size.width() * scale).round().max(1.0) as u32;
    let height = height_px.max(1);

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| Error::Logo(format!("cannot allocate {}x{} pixmap", width, height)))?;
    resvg::render(
        tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    // tiny-skia stores premultiplied colour; PNG and PDF want it straight
    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    Ok(RasterLogo { width, height, rgba })
}

/// Make sure a PNG rendition of the SVG logo exists
///
/// An existing PNG is never touched unless `refresh` is set. The file is
/// encoded in memory and written in one go, so a failure leaves no partial
/// PNG behind.
pub fn ensure_png(svg: &Path, png: &Path, size: u32, refresh: bool) -> Result<LogoStatus> {
    if png.exists() && !refresh {
        debug!("Logo PNG cached at {}", png.display());
        return Ok(LogoStatus::Cached);
    }
    if !svg.exists() {
        debug!("No SVG logo at {}", svg.display());
        return Ok(LogoStatus::SourceMissing);
    }

    let tree = load_svg(svg)?;
    let logo = rasterize(&tree, size)?;
    let bytes = logo.to_png()?;

    if let Some(parent) = png.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(png, bytes)?;
    info!("Rendered {} -> {} ({}x{})", svg.display(), png.display(), logo.width, logo.height);

    Ok(LogoStatus::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WIDE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="48" height="24" viewBox="0 0 48 24"><rect x="0" y="0" width="48" height="24" fill="#003654"/></svg>"##;

    fn write_svg(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("logo.svg");
        fs::write(&path, WIDE_SVG).unwrap();
        path
    }

    #[test]
    fn test_rasterize_keeps_aspect_ratio() {
        let dir = TempDir::new().unwrap();
        let tree = load_svg(&write_svg(&dir)).unwrap();
        let logo = rasterize(&tree, 64).unwrap();

        assert_eq!(logo.height, 64);
        assert_eq!(logo.width, 128);
        assert_eq!(logo.rgba.len(), 128 * 64 * 4);
        assert_eq!(logo.rgb().len(), 128 * 64 * 3);
        // Solid fill: centre pixel is the brand navy, fully opaque
        let centre = ((32 * 128 + 64) * 4) as usize;
        assert_eq!(&logo.rgba[centre..centre + 4], &[0x00, 0x36, 0x54, 0xFF]);
    }

    #[test]
    fn test_svg_text_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lettered.svg");
        fs::write(
            &path,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="48" height="24" viewBox="0 0 48 24"><rect x="0" y="0" width="24" height="24" fill="#003654"/><text x="26" y="18" font-size="16" fill="#003654">LB</text></svg>"##,
        )
        .unwrap();

        assert!(has_text_elements(&fs::read(&path).unwrap()));
        let logo = rasterize(&load_svg(&path).unwrap(), 24).unwrap();

        assert_eq!((logo.width, logo.height), (48, 24));
        // Shape drawn, lettering area left transparent
        let pixel = |x: usize, y: usize| logo.rgba[(y * 48 + x) * 4 + 3];
        assert_eq!(pixel(12, 12), 0xFF);
        assert!((26..48).all(|x| pixel(x, 12) == 0));
    }

    #[test]
    fn test_shapes_only_svg_has_no_text() {
        assert!(!has_text_elements(WIDE_SVG.as_bytes()));
        assert!(!has_text_elements(b"not svg"));
    }

    #[test]
    fn test_load_svg_missing_file() {
        let result = load_svg(Path::new("no-such-logo.svg"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_load_svg_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.svg");
        fs::write(&path, "this is not svg").unwrap();
        assert!(load_svg(&path).is_err());
    }

    #[test]
    fn test_ensure_png_writes_once() {
        let dir = TempDir::new().unwrap();
        let svg = write_svg(&dir);
        let png = dir.path().join("img").join("logo-128.png");

        assert_eq!(ensure_png(&svg, &png, 128, false).unwrap(), LogoStatus::Written);
        let first = fs::read(&png).unwrap();
        assert_eq!(&first[1..4], b"PNG");

        assert_eq!(ensure_png(&svg, &png, 128, false).unwrap(), LogoStatus::Cached);
        assert_eq!(ensure_png(&svg, &png, 128, true).unwrap(), LogoStatus::Written);
    }

    #[test]
    fn test_ensure_png_without_source() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("logo.png");
        let status = ensure_png(&dir.path().join("absent.svg"), &png, 128, false).unwrap();
        assert_eq!(status, LogoStatus::SourceMissing);
        assert!(!png.exists());
    }
}
