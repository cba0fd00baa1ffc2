//! Collision primitives and manifold generation.
//!
//! Every collider collapses to one of two world-space primitives: a capsule
//! (segment plus radius; segments are capsules with a thin skin) or an
//! oriented box. Manifolds carry a unit normal pointing from primitive A
//! toward primitive B and one or two contact points with penetration depths.

use glam::Vec2;
use smallvec::SmallVec;

use super::Rot;

const DEGENERATE_EPS: f32 = 1e-6;

/// World-space collision primitive.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Prim {
    Capsule { p1: Vec2, p2: Vec2, radius: f32 },
    Obb { center: Vec2, rot: Rot, half: Vec2 },
}

/// Axis-aligned bounds used by the broad phase.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

impl Prim {
    pub fn aabb(&self, margin: f32) -> Aabb {
        match *self {
            Prim::Capsule { p1, p2, radius } => {
                let pad = Vec2::splat(radius + margin);
                Aabb {
                    min: p1.min(p2) - pad,
                    max: p1.max(p2) + pad,
                }
            }
            Prim::Obb { center, rot, half } => {
                let extent = Vec2::new(
                    rot.c.abs() * half.x + rot.s.abs() * half.y,
                    rot.s.abs() * half.x + rot.c.abs() * half.y,
                ) + Vec2::splat(margin);
                Aabb {
                    min: center - extent,
                    max: center + extent,
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ContactPoint {
    pub point: Vec2,
    pub penetration: f32,
}

/// Contact manifold between two primitives.
#[derive(Clone, Debug)]
pub(crate) struct Manifold {
    /// Unit normal pointing from primitive A toward primitive B.
    pub normal: Vec2,
    pub points: SmallVec<[ContactPoint; 2]>,
}

impl Manifold {
    fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// Generate a manifold for an overlapping pair, `None` when separated.
pub(crate) fn collide(a: &Prim, b: &Prim) -> Option<Manifold> {
    match (*a, *b) {
        (
            Prim::Capsule { p1, p2, radius },
            Prim::Capsule {
                p1: q1,
                p2: q2,
                radius: radius_b,
            },
        ) => capsule_capsule(p1, p2, radius, q1, q2, radius_b),
        (Prim::Capsule { p1, p2, radius }, Prim::Obb { center, rot, half }) => {
            capsule_obb(p1, p2, radius, center, rot, half)
        }
        (Prim::Obb { center, rot, half }, Prim::Capsule { p1, p2, radius }) => {
            capsule_obb(p1, p2, radius, center, rot, half).map(Manifold::flipped)
        }
        (
            Prim::Obb { center, rot, half },
            Prim::Obb {
                center: center_b,
                rot: rot_b,
                half: half_b,
            },
        ) => obb_obb(center, rot, half, center_b, rot_b, half_b),
    }
}

fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < DEGENERATE_EPS {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest points between two segments (Ericson, Real-Time Collision
/// Detection, 5.1.9).
fn closest_points_between_segments(p1: Vec2, q1: Vec2, p2: Vec2, q2: Vec2) -> (Vec2, Vec2) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    if a < DEGENERATE_EPS && e < DEGENERATE_EPS {
        return (p1, p2);
    }

    let (s, t);
    if a < DEGENERATE_EPS {
        s = 0.0;
        t = (f / e).clamp(0.0, 1.0);
    } else {
        let c = d1.dot(r);
        if e < DEGENERATE_EPS {
            t = 0.0;
            s = (-c / a).clamp(0.0, 1.0);
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s0 = if denom.abs() > DEGENERATE_EPS {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t0 = (b * s0 + f) / e;
            if t0 < 0.0 {
                t0 = 0.0;
                s0 = (-c / a).clamp(0.0, 1.0);
            } else if t0 > 1.0 {
                t0 = 1.0;
                s0 = ((b - c) / a).clamp(0.0, 1.0);
            }
            s = s0;
            t = t0;
        }
    }

    (p1 + d1 * s, p2 + d2 * t)
}

fn capsule_capsule(
    p1: Vec2,
    q1: Vec2,
    radius_a: f32,
    p2: Vec2,
    q2: Vec2,
    radius_b: f32,
) -> Option<Manifold> {
    let (ca, cb) = closest_points_between_segments(p1, q1, p2, q2);
    let d = cb - ca;
    let total = radius_a + radius_b;
    let dist_sq = d.length_squared();
    if dist_sq > total * total {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > DEGENERATE_EPS { d / dist } else { Vec2::Y };
    let surface_a = ca + normal * radius_a;
    let surface_b = cb - normal * radius_b;
    let mut points = SmallVec::new();
    points.push(ContactPoint {
        point: (surface_a + surface_b) * 0.5,
        penetration: total - dist,
    });
    Some(Manifold { normal, points })
}

/// Closest point on the box to `p`, and whether `p` lies inside the box.
fn obb_closest_point(center: Vec2, rot: Rot, half: Vec2, p: Vec2) -> (Vec2, bool) {
    let local = rot.apply_inv(p - center);
    let clamped = local.clamp(-half, half);
    (center + rot.apply(clamped), local == clamped)
}

/// Capsule vs box; the returned normal points from the capsule toward the
/// box.
fn capsule_obb(
    p1: Vec2,
    p2: Vec2,
    radius: f32,
    center: Vec2,
    rot: Rot,
    half: Vec2,
) -> Option<Manifold> {
    // One fixed-point refinement of the closest segment point is enough for
    // the shallow contacts a sub-stepped solver produces.
    let mut s = closest_point_on_segment(p1, p2, center);
    let (q, inside) = obb_closest_point(center, rot, half, s);
    if !inside {
        s = closest_point_on_segment(p1, p2, q);
    }
    let (q, inside) = obb_closest_point(center, rot, half, s);

    let mut points = SmallVec::new();
    if inside {
        let local = rot.apply_inv(s - center);
        let dx = half.x - local.x.abs();
        let dy = half.y - local.y.abs();
        let outward_local = if dx < dy {
            Vec2::new(local.x.signum(), 0.0)
        } else {
            Vec2::new(0.0, local.y.signum())
        };
        points.push(ContactPoint {
            point: s,
            penetration: radius + dx.min(dy),
        });
        return Some(Manifold {
            normal: -rot.apply(outward_local),
            points,
        });
    }

    let d = q - s;
    let dist_sq = d.length_squared();
    if dist_sq > radius * radius {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > DEGENERATE_EPS { d / dist } else { Vec2::Y };
    points.push(ContactPoint {
        point: q,
        penetration: radius - dist,
    });
    Some(Manifold { normal, points })
}

fn obb_radius_on_axis(rot: Rot, half: Vec2, axis: Vec2) -> f32 {
    let x_axis = Vec2::new(rot.c, rot.s);
    let y_axis = Vec2::new(-rot.s, rot.c);
    axis.dot(x_axis).abs() * half.x + axis.dot(y_axis).abs() * half.y
}

fn obb_obb(
    center_a: Vec2,
    rot_a: Rot,
    half_a: Vec2,
    center_b: Vec2,
    rot_b: Rot,
    half_b: Vec2,
) -> Option<Manifold> {
    let axes = [
        Vec2::new(rot_a.c, rot_a.s),
        Vec2::new(-rot_a.s, rot_a.c),
        Vec2::new(rot_b.c, rot_b.s),
        Vec2::new(-rot_b.s, rot_b.c),
    ];
    let d = center_b - center_a;

    let mut best_axis = Vec2::Y;
    let mut best_overlap = f32::MAX;
    for axis in axes {
        let ra = obb_radius_on_axis(rot_a, half_a, axis);
        let rb = obb_radius_on_axis(rot_b, half_b, axis);
        let overlap = ra + rb - d.dot(axis).abs();
        if overlap < 0.0 {
            return None;
        }
        if overlap < best_overlap {
            best_overlap = overlap;
            best_axis = if d.dot(axis) < 0.0 { -axis } else { axis };
        }
    }

    // Contact points span the tangential overlap interval, placed on the
    // mid-plane between the facing surfaces.
    let normal = best_axis;
    let tangent = normal.perp();
    let ra_n = obb_radius_on_axis(rot_a, half_a, normal);
    let rb_n = obb_radius_on_axis(rot_b, half_b, normal);
    let plane = 0.5 * ((center_a.dot(normal) + ra_n) + (center_b.dot(normal) - rb_n));

    let ca_t = center_a.dot(tangent);
    let cb_t = center_b.dot(tangent);
    let ra_t = obb_radius_on_axis(rot_a, half_a, tangent);
    let rb_t = obb_radius_on_axis(rot_b, half_b, tangent);
    let lo = (ca_t - ra_t).max(cb_t - rb_t);
    let hi = (ca_t + ra_t).min(cb_t + rb_t);

    let mut points = SmallVec::new();
    points.push(ContactPoint {
        point: normal * plane + tangent * lo,
        penetration: best_overlap,
    });
    if hi - lo > 1e-4 {
        points.push(ContactPoint {
            point: normal * plane + tangent * hi,
            penetration: best_overlap,
        });
    }

    Some(Manifold { normal, points })
}
