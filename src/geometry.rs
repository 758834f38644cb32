use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned box in surface coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Smallest rect covering both inputs.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Bounding box of every rect in `rects`, or `None` when there are none.
pub fn merge_rects<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    rects
        .into_iter()
        .fold(None, |acc: Option<Rect>, rect| match acc {
            Some(current) => Some(current.union(&rect)),
            None => Some(rect),
        })
}

/// Converts a length measured in global (transformed) space into the local
/// space styles are written in. `scale` is the local-to-global ratio; a
/// degenerate scale leaves the value untouched.
pub fn compensate_scale(value: f32, scale: f32) -> f32 {
    if !scale.is_finite() || scale <= 0.0 {
        return value;
    }
    value / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_both_rects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 5.0, 20.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 25.0, 25.0));
    }

    #[test]
    fn union_with_contained_rect_is_identity() {
        let outer = Rect::new(0.0, 0.0, 50.0, 50.0);
        let inner = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert_eq!(outer.union(&inner), outer);
    }

    #[test]
    fn merge_rects_empty_is_none() {
        assert_eq!(merge_rects(Vec::new()), None);
    }

    #[test]
    fn merge_rects_folds_all_inputs() {
        let merged = merge_rects(vec![
            Rect::new(5.0, 5.0, 1.0, 1.0),
            Rect::new(-3.0, 2.0, 1.0, 1.0),
            Rect::new(0.0, 10.0, 4.0, 4.0),
        ])
        .expect("non-empty input");
        assert_eq!(merged, Rect::new(-3.0, 2.0, 9.0, 12.0));
    }

    #[test]
    fn compensate_scale_divides_by_ratio() {
        assert_eq!(compensate_scale(100.0, 2.0), 50.0);
        assert_eq!(compensate_scale(100.0, 1.0), 100.0);
    }

    #[test]
    fn compensate_scale_ignores_degenerate_ratio() {
        assert_eq!(compensate_scale(42.0, 0.0), 42.0);
        assert_eq!(compensate_scale(42.0, -1.0), 42.0);
        assert_eq!(compensate_scale(42.0, f32::NAN), 42.0);
    }

    #[test]
    fn rect_edges() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.mid_y(), 40.0);
    }
}
