//! Ticket composition.
//!
//! Deterministic pipeline: decode the template, render a QR code carrying
//! the student id, resize the profile photo, paste both plus three text
//! lines onto a transparent overlay at fixed card coordinates, alpha-
//! composite the overlay onto the template, flatten to opaque RGB and
//! encode as PNG. Identical inputs and assets yield byte-identical output.

use std::path::{Path, PathBuf};

use image::{
    codecs::png::PngEncoder, imageops::FilterType, DynamicImage, ExtendedColorType, ImageEncoder,
    Rgba, RgbaImage,
};
use qrcode::QrCode;
use rusttype::{point, Font, Scale};
use thiserror::Error;

// Card geometry, fixed by the ticket design rather than derived from the
// template content. The card rectangle is centered on the template.
const CARD_WIDTH: u32 = 800;
const CARD_HEIGHT: u32 = 300;
const PHOTO_SIZE: u32 = 180;
const SIDE_MARGIN: u32 = 25;
const TOP_MARGIN: u32 = 60;
const TEXT_GAP: u32 = 30;
const NAME_OFFSET_Y: u32 = 10;
const YEAR_OFFSET_Y: u32 = 70;
const ID_OFFSET_Y: u32 = 110;

const NAME_PX: f32 = 48.0;
const DETAILS_PX: f32 = 32.0;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LIGHT_GRAY: Rgba<u8> = Rgba([0xcc, 0xcc, 0xcc, 255]);

// Quiet-zone width around the QR matrix, in modules.
const QR_MARGIN_MODULES: u32 = 4;

pub const TEMPLATE_FILE: &str = "ticket_template.png";
pub const NAME_FONT_FILE: &str = "fonts/DejaVuSans-Bold.ttf";
pub const DETAILS_FONT_FILE: &str = "fonts/DejaVuSans.ttf";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("missing asset {path}: {source}")]
    MissingAsset {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode ticket template: {0}")]
    TemplateDecode(image::ImageError),
    #[error("ticket template is {width}x{height}, smaller than the {CARD_WIDTH}x{CARD_HEIGHT} card")]
    TemplateTooSmall { width: u32, height: u32 },
    #[error("failed to parse font {0}")]
    FontParse(String),
    #[error("invalid profile photo: {0}")]
    PhotoDecode(image::ImageError),
    #[error("failed to build qr code: {0}")]
    Qr(qrcode::types::QrError),
    #[error("failed to encode png: {0}")]
    PngEncode(image::ImageError),
}

/// Template and fonts, loaded once at startup and shared read-only across
/// requests.
#[derive(Debug)]
pub struct TicketAssets {
    template: RgbaImage,
    name_font: Font<'static>,
    details_font: Font<'static>,
}

impl TicketAssets {
    pub fn load(assets_dir: &Path) -> Result<Self, RenderError> {
        let template_path = assets_dir.join(TEMPLATE_FILE);
        let bytes = std::fs::read(&template_path).map_err(|source| RenderError::MissingAsset {
            path: template_path,
            source,
        })?;
        let template = image::load_from_memory(&bytes)
            .map_err(RenderError::TemplateDecode)?
            .to_rgba8();
        if template.width() < CARD_WIDTH || template.height() < CARD_HEIGHT {
            return Err(RenderError::TemplateTooSmall {
                width: template.width(),
                height: template.height(),
            });
        }

        Ok(Self {
            template,
            name_font: load_font(assets_dir, NAME_FONT_FILE)?,
            details_font: load_font(assets_dir, DETAILS_FONT_FILE)?,
        })
    }

    pub fn template_dimensions(&self) -> (u32, u32) {
        self.template.dimensions()
    }

    /// Render the ticket PNG for one registration.
    pub fn render_ticket(
        &self,
        name: &str,
        year: &str,
        student_id: &str,
        photo_bytes: &[u8],
    ) -> Result<Vec<u8>, RenderError> {
        let photo = image::load_from_memory(photo_bytes)
            .map_err(RenderError::PhotoDecode)?
            .resize_exact(PHOTO_SIZE, PHOTO_SIZE, FilterType::Lanczos3)
            .to_rgba8();
        let qr = qr_image(student_id, PHOTO_SIZE)?;

        let (tw, th) = self.template.dimensions();
        let card_left = (tw - CARD_WIDTH) / 2;
        let card_top = (th - CARD_HEIGHT) / 2;
        let photo_x = card_left + SIDE_MARGIN;
        let photo_y = card_top + TOP_MARGIN;
        let qr_x = card_left + CARD_WIDTH - PHOTO_SIZE - SIDE_MARGIN;

        let mut overlay = RgbaImage::from_pixel(tw, th, Rgba([0, 0, 0, 0]));
        paste(&mut overlay, &photo, photo_x, photo_y);
        paste(&mut overlay, &qr, qr_x, photo_y);

        let text_x = (photo_x + PHOTO_SIZE + TEXT_GAP) as i32;
        draw_text(
            &mut overlay,
            &self.name_font,
            NAME_PX,
            text_x,
            (photo_y + NAME_OFFSET_Y) as i32,
            WHITE,
            name,
        );
        draw_text(
            &mut overlay,
            &self.details_font,
            DETAILS_PX,
            text_x,
            (photo_y + YEAR_OFFSET_Y) as i32,
            LIGHT_GRAY,
            year,
        );
        draw_text(
            &mut overlay,
            &self.details_font,
            DETAILS_PX,
            text_x,
            (photo_y + ID_OFFSET_Y) as i32,
            LIGHT_GRAY,
            &format!("ID: {student_id}"),
        );

        let mut out = self.template.clone();
        overlay_alpha(&mut out, &overlay, 0, 0);

        let flat = DynamicImage::ImageRgba8(out).to_rgb8();
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(
                flat.as_raw(),
                flat.width(),
                flat.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(RenderError::PngEncode)?;
        Ok(png)
    }
}

fn load_font(assets_dir: &Path, name: &str) -> Result<Font<'static>, RenderError> {
    let path = assets_dir.join(name);
    let bytes = std::fs::read(&path).map_err(|source| RenderError::MissingAsset { path, source })?;
    Font::try_from_vec(bytes).ok_or_else(|| RenderError::FontParse(name.to_string()))
}

/// Render the QR code for `payload` as an opaque black-on-white square of
/// `size` pixels, including the quiet zone. Modules are drawn on their own
/// pixel grid and scaled with nearest-neighbor so they stay crisp.
fn qr_image(payload: &str, size: u32) -> Result<RgbaImage, RenderError> {
    let code = QrCode::new(payload.as_bytes()).map_err(RenderError::Qr)?;

    let width_modules = code.width() as u32;
    let total_modules = width_modules + 2 * QR_MARGIN_MODULES;
    let module_px = (size / total_modules).max(1);
    let actual = total_modules * module_px;

    let mut img = RgbaImage::from_pixel(actual, actual, WHITE);
    for y in 0..width_modules {
        for x in 0..width_modules {
            if !matches!(code[(x as usize, y as usize)], qrcode::Color::Dark) {
                continue;
            }
            let px0 = (x + QR_MARGIN_MODULES) * module_px;
            let py0 = (y + QR_MARGIN_MODULES) * module_px;
            for py in py0..(py0 + module_px) {
                for px in px0..(px0 + module_px) {
                    img.put_pixel(px, py, Rgba([0, 0, 0, 255]));
                }
            }
        }
    }

    if actual != size {
        img = DynamicImage::ImageRgba8(img)
            .resize_exact(size, size, FilterType::Nearest)
            .to_rgba8();
    }
    Ok(img)
}

/// Copy `src` into `dst` at (x, y), replacing pixels (alpha included).
fn paste(dst: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    for sy in 0..src.height() {
        for sx in 0..src.width() {
            let dx = x + sx;
            let dy = y + sy;
            if dx < dst.width() && dy < dst.height() {
                dst.put_pixel(dx, dy, *src.get_pixel(sx, sy));
            }
        }
    }
}

/// Rasterize `text` onto `img` with its top-left corner at (x, y), using
/// straight-alpha source-over so glyph coverage survives as overlay alpha.
fn draw_text(img: &mut RgbaImage, font: &Font<'static>, px: f32, x: i32, y: i32, color: Rgba<u8>, text: &str) {
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let baseline_y = y as f32 + v_metrics.ascent;
    let mut caret_x = x as f32;

    for ch in text.chars() {
        let glyph = font
            .glyph(ch)
            .scaled(scale)
            .positioned(point(caret_x, baseline_y));
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= img.width() || py >= img.height() {
                    return;
                }
                blend_over(img.get_pixel_mut(px, py), color, v);
            });
        }
        caret_x += glyph.unpositioned().h_metrics().advance_width;
    }
}

fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let sa = coverage.clamp(0.0, 1.0) * (src.0[3] as f32 / 255.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let sc = src.0[c] as f32;
        let dc = dst.0[c] as f32;
        dst.0[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

/// Alpha-composite `over` onto an opaque `base` at (x, y).
fn overlay_alpha(base: &mut RgbaImage, over: &RgbaImage, x: u32, y: u32) {
    for oy in 0..over.height() {
        for ox in 0..over.width() {
            let p = over.get_pixel(ox, oy);
            let a = p.0[3] as f32 / 255.0;
            if a <= 0.0 {
                continue;
            }
            let bx = x + ox;
            let by = y + oy;
            if bx >= base.width() || by >= base.height() {
                continue;
            }
            let dst = base.get_pixel_mut(bx, by);
            let inv = 1.0 - a;
            dst.0[0] = (p.0[0] as f32 * a + dst.0[0] as f32 * inv) as u8;
            dst.0[1] = (p.0[1] as f32 * a + dst.0[1] as f32 * inv) as u8;
            dst.0[2] = (p.0[2] as f32 * a + dst.0[2] as f32 * inv) as u8;
            dst.0[3] = 255;
        }
    }
}
