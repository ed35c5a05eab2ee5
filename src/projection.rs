//! Robinson forward projection and the mapping from projection units into SVG pixels.

use serde::{Deserialize, Serialize};

use crate::constants::{
    ROBINSON_OFFSET_X, ROBINSON_OFFSET_Y, ROBINSON_X_RANGE, ROBINSON_Y_RANGE, WGS84_SEMI_MAJOR_AXIS,
};

// Robinson's table is tabulated every 5 degrees of latitude. Each node holds cubic
// coefficients in the offset (in degrees) from the node latitude, as used by PROJ.
const FXC: f64 = 0.8487;
const FYC: f64 = 1.3523;
const NODE_STEP_DEG: f64 = 5.0;
const NODES: usize = 18;

const X_COEFFS: [[f64; 4]; NODES + 1] = [
    [1.0, 2.2199e-17, -7.15515e-05, 3.1103e-06],
    [0.9986, -0.000482243, -2.4897e-05, -1.3309e-06],
    [0.9954, -0.00083103, -4.48605e-05, -9.86701e-07],
    [0.99, -0.00135364, -5.9661e-05, 3.6777e-06],
    [0.9822, -0.00167442, -4.49547e-06, -5.72411e-06],
    [0.973, -0.00214868, -9.03571e-05, 1.8736e-08],
    [0.96, -0.00305085, -9.00761e-05, 1.64917e-06],
    [0.9427, -0.00382792, -6.53386e-05, -2.6154e-06],
    [0.9216, -0.00467746, -0.00010457, 4.81243e-06],
    [0.8962, -0.00536223, -3.23831e-05, -5.43432e-06],
    [0.8679, -0.00609363, -0.000113898, 3.32484e-06],
    [0.835, -0.00698325, -6.40253e-05, 9.34959e-07],
    [0.7986, -0.00755338, -5.00009e-05, 9.35324e-07],
    [0.7597, -0.00798324, -3.5971e-05, -2.27626e-06],
    [0.7186, -0.00851367, -7.01149e-05, -8.6303e-06],
    [0.6732, -0.00986209, -0.000199569, 1.91974e-05],
    [0.6213, -0.010418, 8.83923e-05, 6.24051e-06],
    [0.5722, -0.00906601, 0.000182, 6.24051e-06],
    [0.5322, -0.00677797, 0.000275608, 6.24051e-06],
];

const Y_COEFFS: [[f64; 4]; NODES + 1] = [
    [-5.20417e-18, 0.0124, 1.21431e-18, -8.45284e-11],
    [0.062, 0.0124, -1.26793e-09, 4.22642e-10],
    [0.124, 0.0124, 5.07171e-09, -1.60604e-09],
    [0.186, 0.0123999, -1.90189e-08, 6.00152e-09],
    [0.248, 0.0124002, 7.10039e-08, -2.24e-08],
    [0.31, 0.0123992, -2.64997e-07, 8.35986e-08],
    [0.372, 0.0124029, 9.88983e-07, -3.11994e-07],
    [0.434, 0.0123893, -3.69093e-06, -4.35621e-07],
    [0.4958, 0.0123198, -1.02252e-05, -3.45523e-07],
    [0.5571, 0.0121916, -1.54081e-05, -5.82288e-07],
    [0.6176, 0.0119938, -2.41424e-05, -5.25327e-07],
    [0.6769, 0.011713, -3.20223e-05, -5.16405e-07],
    [0.7346, 0.0113541, -3.97684e-05, -6.09052e-07],
    [0.7903, 0.0109107, -4.89042e-05, -1.04739e-06],
    [0.8435, 0.0103431, -6.4615e-05, -1.40374e-09],
    [0.8936, 0.00969686, -6.4636e-05, -8.547e-06],
    [0.9394, 0.00840947, -0.000192841, -4.2106e-06],
    [0.9761, 0.00616527, -0.000256, -4.2106e-06],
    [1.0, 0.00328947, -0.000319159, -4.2106e-06],
];

fn cubic(c: &[f64; 4], z: f64) -> f64 {
    c[0] + z * (c[1] + z * (c[2] + z * c[3]))
}

/// Brings a longitude outside [-180, 180] back into that range. The antimeridian itself is kept.
pub fn wrap_longitude(lon_deg: f64) -> f64 {
    if lon_deg.abs() <= 180.0 {
        lon_deg
    } else {
        (lon_deg + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Projects geographic degrees onto the unit Robinson plane (sphere radius 1).
///
/// Longitude is taken relative to the 0° meridian and wrapped into [-180, 180]; latitude
/// is clamped to the poles.
pub fn robinson_unit(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let abs_lat = lat_deg.abs().min(90.0);
    let mut node = (abs_lat / NODE_STEP_DEG + 1e-15).floor() as usize;
    if node >= NODES {
        node = NODES - 1;
    }
    let offset = abs_lat - NODE_STEP_DEG * node as f64;

    let x = cubic(&X_COEFFS[node], offset) * FXC * wrap_longitude(lon_deg).to_radians();
    let y = cubic(&Y_COEFFS[node], offset) * FYC;
    (x, if lat_deg < 0.0 { -y } else { y })
}

/// Extent and calibration of the projected plane relative to the SVG canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionFrame {
    pub semi_major_axis: f64,
    pub x_range: f64,
    pub y_range: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ProjectionFrame {
    fn default() -> Self {
        Self {
            semi_major_axis: WGS84_SEMI_MAJOR_AXIS,
            x_range: ROBINSON_X_RANGE,
            y_range: ROBINSON_Y_RANGE,
            offset_x: ROBINSON_OFFSET_X,
            offset_y: ROBINSON_OFFSET_Y,
        }
    }
}

impl ProjectionFrame {
    /// Robinson forward projection in projection units (meters).
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let (x, y) = robinson_unit(lon_deg, lat_deg);
        (x * self.semi_major_axis, y * self.semi_major_axis)
    }

    /// Maps projected coordinates into canvas pixels. The y axis is flipped since SVG grows downward.
    pub fn to_canvas(&self, x_proj: f64, y_proj: f64, canvas: CanvasSize) -> (f64, f64) {
        let x = (x_proj + self.offset_x) * (canvas.width / self.x_range);
        let y = (self.offset_y - y_proj) * (canvas.height / self.y_range);
        (x, y)
    }

    /// Geographic degrees straight to canvas pixels.
    pub fn place(&self, lon_deg: f64, lat_deg: f64, canvas: CanvasSize) -> (f64, f64) {
        let (x, y) = self.project(lon_deg, lat_deg);
        self.to_canvas(x, y, canvas)
    }
}

/// Pixel size of the template canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn origin_maps_to_origin() {
        let (x, y) = ProjectionFrame::default().project(0.0, 0.0);
        assert!(close(x, 0.0, 1e-6));
        assert!(close(y, 0.0, 1e-6));
    }

    #[test]
    fn equator_edge_and_pole_match_robinson_extent() {
        let frame = ProjectionFrame::default();

        let (x, _) = frame.project(180.0, 0.0);
        // 0.8487 * pi * a
        assert!(close(x, 17_005_833.33, 1.0), "x = {x}");

        let (_, y) = frame.project(0.0, 90.0);
        // 1.3523 * a
        assert!(close(y, 8_625_154.66, 1.0), "y = {y}");
    }

    #[test]
    fn tabulated_nodes_are_hit_exactly() {
        // At 45 degrees the table gives X = 0.8962 and Y = 0.5571
        let (x, y) = robinson_unit(180.0, 45.0);
        assert!(close(x, 0.8962 * FXC * std::f64::consts::PI, 1e-12));
        assert!(close(y, 0.5571 * FYC, 1e-12));
    }

    #[test]
    fn points_between_nodes_match_proj_robin() {
        // (lon, lat, x, y) on a 1000x500 canvas, PROJ robin forward with a = 6378137
        let cases = [
            (139.69, 35.69, 682.1068279891466, 143.65932244847195),
            (-58.38, -34.6, 344.6761670756017, 294.0113996764208),
            (10.0, 12.3, 462.421096452953, 193.68982695226305),
            (-100.0, 57.8, 296.9437326236216, 97.62043894602259),
            (60.0, 72.4, 520.2044572901394, 70.2757265761135),
            (-30.0, -83.1, 412.4070420389481, 386.20512905119347),
            (25.0, -88.7, 468.94433023529984, 391.67397089427936),
        ];
        let frame = ProjectionFrame::default();
        let canvas = CanvasSize {
            width: 1000.0,
            height: 500.0,
        };

        for (lon, lat, want_x, want_y) in cases {
            let (x, y) = frame.place(lon, lat, canvas);
            assert!(close(x, want_x, 1e-6), "x at ({lon}, {lat}) = {x}");
            assert!(close(y, want_y, 1e-6), "y at ({lon}, {lat}) = {y}");
        }
    }

    #[test]
    fn longitudes_past_the_antimeridian_wrap() {
        let frame = ProjectionFrame::default();
        let canvas = CanvasSize {
            width: 1000.0,
            height: 500.0,
        };

        assert_eq!(frame.place(190.0, 0.0, canvas), frame.place(-170.0, 0.0, canvas));
        assert_eq!(frame.place(-200.0, 20.0, canvas), frame.place(160.0, 20.0, canvas));
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(-180.0), -180.0);
        assert_eq!(wrap_longitude(540.0), -180.0);
    }

    #[test]
    fn symmetric_about_equator_and_meridian() {
        let (x1, y1) = robinson_unit(120.0, 33.0);
        let (x2, y2) = robinson_unit(-120.0, -33.0);
        assert!(close(x1, -x2, 1e-12));
        assert!(close(y1, -y2, 1e-12));
    }

    #[test]
    fn latitude_is_monotonic() {
        let mut last = -1.0;
        for lat in 0..=90 {
            let (_, y) = robinson_unit(0.0, lat as f64);
            assert!(y > last, "not increasing at {lat}");
            last = y;
        }
    }

    #[test]
    fn canvas_mapping_keeps_calibrated_offsets() {
        let frame = ProjectionFrame::default();
        let canvas = CanvasSize {
            width: 1000.0,
            height: 500.0,
        };

        let (x, y) = frame.to_canvas(0.0, 0.0, canvas);
        assert!(close(x, 23_200_000.0 * 1000.0 / 52_200_000.0, 1e-9));
        assert!(close(y, 11_000_000.0 * 500.0 / 25_000_000.0, 1e-9));
        assert!(close(y, 220.0, 1e-9));
    }

    #[test]
    fn north_is_up_on_the_canvas() {
        let frame = ProjectionFrame::default();
        let canvas = CanvasSize {
            width: 1000.0,
            height: 500.0,
        };
        let (_, north) = frame.place(0.0, 60.0, canvas);
        let (_, south) = frame.place(0.0, -60.0, canvas);
        assert!(north < south);
    }
}
