/// Skin range on the OpenCV 8-bit HSV scale (H in 0..180).
pub const SKIN_HSV_LOWER: [u8; 3] = [0, 20, 70];
pub const SKIN_HSV_UPPER: [u8; 3] = [20, 255, 255];

/// Seconds a closed hand must stay in the interaction zone before a drag starts.
pub const DRAG_HOLD_THRESHOLD_SECS: f64 = 6.0;

/// Default interaction zone ("column A"): fixed left/top margins, right edge
/// at a third of the frame width, bottom margin from the frame height.
pub const ZONE_LEFT: i32 = 50;
pub const ZONE_TOP: i32 = 100;
pub const ZONE_BOTTOM_MARGIN: i32 = 100;

/// Gesture-history capacity; the oldest entry is evicted first.
pub const GESTURE_HISTORY_LEN: usize = 10;

pub const HUMAN_MIN_AREA: f64 = 10_000.0;
pub const HUMAN_MAX_AREA: f64 = 300_000.0;

/// Minimum hand area while face detection runs alongside hand detection,
/// so a face-sized blob is not mistaken for a fist.
pub const FACE_AWARE_MIN_HAND_AREA: f64 = 8_000.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
