//! Geometric primitives for stamp placement.
//!
//! Placement is described in top-left-origin page coordinates, the way a
//! reader looks at a page on screen. [`PageFrame`] maps such a rectangle to
//! PDF user space, taking the page's CropBox and `/Rotate` into account.

use serde::{Deserialize, Serialize};

/// A rectangle in top-left-origin page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_barcode_stamper::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from its top-left and bottom-right corners.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_barcode_stamper::geometry::Rect;
    ///
    /// let rect = Rect::from_points(20.0, 692.0, 220.0, 772.0);
    /// assert_eq!(rect.width, 200.0);
    /// assert_eq!(rect.height, 80.0);
    /// ```
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Get the left edge x-coordinate.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the top edge y-coordinate.
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A page's MediaBox in PDF user space: `[llx lly urx ury]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    /// Lower-left x
    pub llx: f32,
    /// Lower-left y
    pub lly: f32,
    /// Upper-right x
    pub urx: f32,
    /// Upper-right y
    pub ury: f32,
}

impl PageBox {
    /// US Letter, used when a page declares no MediaBox anywhere in its tree.
    pub const LETTER: PageBox = PageBox {
        llx: 0.0,
        lly: 0.0,
        urx: 612.0,
        ury: 792.0,
    };

    /// Build a box from the four MediaBox numbers, normalizing swapped corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    /// Page width in user space units.
    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    /// Page height in user space units.
    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Overlap of two boxes, `None` when they do not overlap.
    pub fn intersect(&self, other: &PageBox) -> Option<PageBox> {
        let clipped = PageBox {
            llx: self.llx.max(other.llx),
            lly: self.lly.max(other.lly),
            urx: self.urx.min(other.urx),
            ury: self.ury.min(other.ury),
        };
        if clipped.width() > 0.0 && clipped.height() > 0.0 {
            Some(clipped)
        } else {
            None
        }
    }
}

/// Page `/Rotate` value, as the clockwise quarter turns applied on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Displayed as stored
    #[default]
    None,
    /// Turned 90 degrees clockwise
    Clockwise90,
    /// Turned upside down
    Half,
    /// Turned 270 degrees clockwise
    Clockwise270,
}

impl Rotation {
    /// Normalize a `/Rotate` value. Values that are not a multiple of 90 are
    /// not valid PDF and are treated as no rotation.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Clockwise90,
            180 => Rotation::Half,
            270 => Rotation::Clockwise270,
            _ => Rotation::None,
        }
    }

    /// Rotation in degrees.
    pub fn degrees(&self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Half => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// True when display swaps the page's width and height.
    pub fn is_quarter_turn(&self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Clockwise270)
    }
}

/// The visible area of a page: its effective CropBox and display rotation.
///
/// "Visual" coordinates have their origin at the bottom-left corner of the
/// page as it appears on screen, x to the right and y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Visible region in user space
    pub crop: PageBox,
    /// Display rotation
    pub rotation: Rotation,
}

impl PageFrame {
    /// Frame for a crop box and rotation.
    pub fn new(crop: PageBox, rotation: Rotation) -> Self {
        Self { crop, rotation }
    }

    /// Width of the page as displayed.
    pub fn width(&self) -> f32 {
        if self.rotation.is_quarter_turn() {
            self.crop.height()
        } else {
            self.crop.width()
        }
    }

    /// Height of the page as displayed.
    pub fn height(&self) -> f32 {
        if self.rotation.is_quarter_turn() {
            self.crop.width()
        } else {
            self.crop.height()
        }
    }

    /// Map a visual point to user space.
    pub fn to_user(&self, u: f32, v: f32) -> (f32, f32) {
        let c = &self.crop;
        match self.rotation {
            Rotation::None => (c.llx + u, c.lly + v),
            Rotation::Clockwise90 => (c.urx - v, c.lly + u),
            Rotation::Half => (c.urx - u, c.ury - v),
            Rotation::Clockwise270 => (c.llx + v, c.ury - u),
        }
    }

    /// User-space images of the visual unit vectors, as `[a b c d]`.
    pub fn basis(&self) -> [f32; 4] {
        match self.rotation {
            Rotation::None => [1.0, 0.0, 0.0, 1.0],
            Rotation::Clockwise90 => [0.0, 1.0, -1.0, 0.0],
            Rotation::Half => [-1.0, 0.0, 0.0, -1.0],
            Rotation::Clockwise270 => [0.0, -1.0, 1.0, 0.0],
        }
    }

    /// `cm` operands mapping the unit square onto `rect`, given in
    /// top-left-origin visual coordinates. The image appears upright on
    /// screen whatever the page rotation.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_barcode_stamper::geometry::{PageBox, PageFrame, Rect, Rotation};
    ///
    /// let frame = PageFrame::new(PageBox::LETTER, Rotation::None);
    /// let matrix = frame.image_matrix(&Rect::from_points(20.0, 692.0, 220.0, 772.0));
    /// assert_eq!(matrix, [200.0, 0.0, 0.0, 80.0, 20.0, 20.0]);
    /// ```
    pub fn image_matrix(&self, rect: &Rect) -> [f32; 6] {
        let [a, b, c, d] = self.basis();
        let (e, f) = self.to_user(rect.left(), self.height() - rect.bottom());
        [
            a * rect.width,
            b * rect.width,
            c * rect.height,
            d * rect.height,
            e,
            f,
        ]
    }

    /// `Tm` operands putting a text baseline origin at visual top-left
    /// coordinates `(x, y)`, reading upright on screen.
    pub fn text_matrix(&self, x: f32, y: f32) -> [f32; 6] {
        let [a, b, c, d] = self.basis();
        let (e, f) = self.to_user(x, self.height() - y);
        [a, b, c, d, e, f]
    }
}

/// Where the barcode lands on each page.
///
/// The footprint's left edge sits `margin_left` units from the page's left
/// edge and its bottom edge sits `margin_bottom` units above the page's bottom
/// edge, both measured on the page as displayed. When a caption is drawn, the
/// bottom of the footprint is given to the caption and the bars fill the rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampPlacement {
    /// Distance from the left page edge
    pub margin_left: f32,
    /// Distance from the bottom page edge
    pub margin_bottom: f32,
    /// Footprint width
    pub width: f32,
    /// Footprint height
    pub height: f32,
    /// Caption font size; zero disables the caption
    pub caption_size: f32,
}

impl Default for StampPlacement {
    fn default() -> Self {
        Self {
            margin_left: 20.0,
            margin_bottom: 20.0,
            width: 200.0,
            height: 80.0,
            caption_size: 10.0,
        }
    }
}

impl StampPlacement {
    /// Target rectangle for a page of the given height, in top-left-origin space.
    ///
    /// With the defaults the top edge is `page_height - 100` and the bottom
    /// edge is `page_height - 20`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_barcode_stamper::geometry::StampPlacement;
    ///
    /// let rect = StampPlacement::default().target_rect(842.0);
    /// assert_eq!(rect.left(), 20.0);
    /// assert_eq!(rect.right(), 220.0);
    /// assert_eq!(rect.top(), 742.0);
    /// assert_eq!(rect.bottom(), 822.0);
    /// ```
    pub fn target_rect(&self, page_height: f32) -> Rect {
        let x_start = self.margin_left;
        let y_end = page_height - self.margin_bottom;
        let y_start = y_end - self.height;
        let x_end = x_start + self.width;
        Rect::from_points(x_start, y_start, x_end, y_end)
    }

    /// Height reserved at the bottom of the footprint for the caption.
    pub fn caption_band(&self) -> f32 {
        if self.caption_size > 0.0 {
            (self.caption_size * 1.5).min(self.height / 2.0)
        } else {
            0.0
        }
    }

    /// Split a footprint into the bars area and, if captioned, the band below it.
    pub fn split(&self, target: &Rect, captioned: bool) -> (Rect, Option<Rect>) {
        let band = self.caption_band();
        if !captioned || band <= 0.0 {
            return (*target, None);
        }
        let bars = Rect::new(target.x, target.y, target.width, target.height - band);
        let caption = Rect::new(target.x, bars.bottom(), target.width, band);
        (bars, Some(caption))
    }
}
