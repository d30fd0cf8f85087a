//! Flight path implementations on the airspace plane (km).

use atcsim_core::spatial::KM_PER_NM;
use std::f64::consts::TAU;

/// Kilometres per second at one knot.
const KM_PER_SEC_PER_KT: f64 = KM_PER_NM / 3600.0;

/// Trait for flight path implementations.
pub trait FlightPath: Send + Sync {
    /// Get (x_km, y_km, altitude_ft) at time t seconds from start.
    fn get_position(&self, t: f64) -> (f64, f64, f64);

    /// Get ground track at time t (degrees, 0 = north).
    fn get_track(&self, t: f64) -> f64 {
        // Default: estimate track from position delta
        let dt = 0.1;
        let (x1, y1, _) = self.get_position(t);
        let (x2, y2, _) = self.get_position(t + dt);

        let dx = x2 - x1;
        let dy = y2 - y1;
        if dx.abs() < 1e-12 && dy.abs() < 1e-12 {
            return 0.0;
        }

        dx.atan2(dy).to_degrees().rem_euclid(360.0)
    }

    /// Get speed in knots.
    fn get_speed_kt(&self) -> f64;
}

/// Straight-line path at constant speed, stopping at the end point.
pub struct LinearPath {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub altitude_ft: f64,
    /// Feet per minute, positive climbing
    pub vertical_rate_fpm: f64,
    pub speed_kt: f64,
    duration: f64,
    track: f64,
}

impl LinearPath {
    pub fn new(start: (f64, f64), end: (f64, f64), altitude_ft: f64, speed_kt: f64) -> Self {
        let distance_km = (end.0 - start.0).hypot(end.1 - start.1);
        let duration = if speed_kt > 0.0 {
            distance_km / (speed_kt * KM_PER_SEC_PER_KT)
        } else {
            0.0
        };
        let track = (end.0 - start.0)
            .atan2(end.1 - start.1)
            .to_degrees()
            .rem_euclid(360.0);

        Self {
            start,
            end,
            altitude_ft,
            vertical_rate_fpm: 0.0,
            speed_kt,
            duration,
            track,
        }
    }

    /// Path starting at `start` flying `track_deg` for `length_km`.
    pub fn along_track(
        start: (f64, f64),
        track_deg: f64,
        length_km: f64,
        altitude_ft: f64,
        speed_kt: f64,
    ) -> Self {
        let rad = track_deg.to_radians();
        let end = (start.0 + length_km * rad.sin(), start.1 + length_km * rad.cos());
        Self::new(start, end, altitude_ft, speed_kt)
    }

    pub fn with_vertical_rate(mut self, fpm: f64) -> Self {
        self.vertical_rate_fpm = fpm;
        self
    }
}

impl FlightPath for LinearPath {
    fn get_position(&self, t: f64) -> (f64, f64, f64) {
        let progress = if self.duration > 0.0 {
            (t / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let x = self.start.0 + progress * (self.end.0 - self.start.0);
        let y = self.start.1 + progress * (self.end.1 - self.start.1);
        let altitude = self.altitude_ft + self.vertical_rate_fpm * t.min(self.duration) / 60.0;
        (x, y, altitude)
    }

    fn get_track(&self, _t: f64) -> f64 {
        self.track
    }

    fn get_speed_kt(&self) -> f64 {
        self.speed_kt
    }
}

/// Orbit around a fix, as flown in a hold.
pub struct CircularPath {
    pub center: (f64, f64),
    pub radius_km: f64,
    pub altitude_ft: f64,
    pub speed_kt: f64,
    pub start_angle: f64,
    pub clockwise: bool,
    period: f64,
}

impl CircularPath {
    pub fn new(
        center: (f64, f64),
        radius_km: f64,
        altitude_ft: f64,
        speed_kt: f64,
        start_angle: f64,
        clockwise: bool,
    ) -> Self {
        let circumference = TAU * radius_km;
        let period = circumference / (speed_kt * KM_PER_SEC_PER_KT);

        Self {
            center,
            radius_km,
            altitude_ft,
            speed_kt,
            start_angle,
            clockwise,
            period,
        }
    }
}

impl FlightPath for CircularPath {
    fn get_position(&self, t: f64) -> (f64, f64, f64) {
        let swept = TAU * t / self.period;
        let angle = if self.clockwise {
            self.start_angle + swept
        } else {
            self.start_angle - swept
        };

        (
            self.center.0 + self.radius_km * angle.sin(),
            self.center.1 + self.radius_km * angle.cos(),
            self.altitude_ft,
        )
    }

    fn get_speed_kt(&self) -> f64 {
        self.speed_kt
    }
}
