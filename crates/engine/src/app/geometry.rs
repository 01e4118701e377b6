#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned rectangle in reference-canvas units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let rect = RectF::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Vec2 { x: 10.0, y: 10.0 }));
        assert!(rect.contains(Vec2 { x: 29.9, y: 29.9 }));
        assert!(!rect.contains(Vec2 { x: 30.0, y: 15.0 }));
        assert!(!rect.contains(Vec2 { x: 15.0, y: 9.9 }));
    }
}
