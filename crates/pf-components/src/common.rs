//! Common utilities for component calculations.

use pf_bloodgas::BloodContent;
use pf_core::numeric::ensure_finite;
use pf_core::{AttrValue, CompId};
use tracing::warn;

use crate::context::{TickContext, VolumeGuard};
use crate::error::{ComponentError, ComponentResult};
use crate::traits::RegistryHandle;

/// Pressure differences below this are treated as no gradient (mmHg).
pub const EPSILON_PRESSURE: f64 = 1e-12;

/// Ensure a value is finite, returning ComponentError if not.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<()> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what })?;
    Ok(())
}

/// Determine flow direction: 1.0 for forward (p1 > p2), -1.0 for reverse.
///
/// Returns 0.0 if the pressure difference is negligible.
pub fn flow_direction(p1: f64, p2: f64) -> f64 {
    let dp = p1 - p2;
    if dp.abs() < EPSILON_PRESSURE {
        0.0
    } else if dp > 0.0 {
        1.0
    } else {
        -1.0
    }
}

pub fn number(key: &str, value: &AttrValue) -> ComponentResult<f64> {
    let v = value.as_f64().map_err(|e| ComponentError::attr(key, e))?;
    if !v.is_finite() {
        return Err(ComponentError::InvalidValue {
            key: key.to_string(),
            reason: "must be finite",
        });
    }
    Ok(v)
}

pub fn non_negative(key: &str, value: &AttrValue) -> ComponentResult<f64> {
    let v = number(key, value)?;
    if v < 0.0 {
        return Err(ComponentError::InvalidValue {
            key: key.to_string(),
            reason: "must be non-negative",
        });
    }
    Ok(v)
}

pub fn positive(key: &str, value: &AttrValue) -> ComponentResult<f64> {
    let v = number(key, value)?;
    if v <= 0.0 {
        return Err(ComponentError::InvalidValue {
            key: key.to_string(),
            reason: "must be positive",
        });
    }
    Ok(v)
}

pub fn flag(key: &str, value: &AttrValue) -> ComponentResult<bool> {
    value.as_bool().map_err(|e| ComponentError::attr(key, e))
}

pub fn text(key: &str, value: &AttrValue) -> ComponentResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .map_err(|e| ComponentError::attr(key, e))
}

pub fn names(key: &str, value: &AttrValue) -> ComponentResult<Vec<String>> {
    value.as_names().map_err(|e| ComponentError::attr(key, e))
}

pub fn unknown(component: &str, key: &str) -> ComponentError {
    ComponentError::UnknownAttribute {
        component: component.to_string(),
        key: key.to_string(),
    }
}

/// Resolve `target` and check that it is a capacitive compartment.
pub fn resolve_capacitive(
    owner: &str,
    target: &str,
    registry: &dyn RegistryHandle,
) -> ComponentResult<CompId> {
    let id = registry
        .lookup(target)
        .ok_or_else(|| ComponentError::UnresolvedReference {
            component: owner.to_string(),
            target: target.to_string(),
        })?;
    let capacitive = registry
        .component(id)
        .and_then(|c| c.as_capacitive())
        .is_some();
    if !capacitive {
        return Err(ComponentError::NotCapacitive {
            component: owner.to_string(),
            target: target.to_string(),
        });
    }
    Ok(id)
}

/// Move `dv` from `from` to `to`.
///
/// Whatever `from` cannot supply is withheld from `to`, so the volume
/// credited always equals the volume debited. Returns the shortfall.
pub fn transfer_volume(
    ctx: &mut TickContext<'_>,
    from: CompId,
    to: CompId,
    dv: f64,
) -> ComponentResult<f64> {
    let (source, shortfall) = {
        let upstream = ctx.capacitive_mut(from)?;
        let source: Option<BloodContent> = upstream.content();
        let shortfall = upstream.volume_out(dv);
        (source, shortfall)
    };
    ctx.capacitive_mut(to)?
        .volume_in(dv - shortfall, source.as_ref());
    Ok(shortfall)
}

/// Apply the negative-volume policy to `vol`.
pub fn guard_volume(component: &str, vol: &mut f64, guard: VolumeGuard) -> ComponentResult<()> {
    if *vol >= 0.0 {
        return Ok(());
    }
    match guard {
        VolumeGuard::Abort => Err(ComponentError::NegativeVolume {
            component: component.to_string(),
            volume: *vol,
        }),
        VolumeGuard::Clamp => {
            warn!(component, volume = *vol, "negative volume clamped to zero");
            *vol = 0.0;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_direction() {
        assert_eq!(flow_direction(100.0, 50.0), 1.0);
        assert_eq!(flow_direction(50.0, 100.0), -1.0);
        assert_eq!(flow_direction(100.0, 100.0), 0.0);
    }

    #[test]
    fn test_check_finite() {
        assert!(check_finite(1.0, "test").is_ok());
        assert!(check_finite(f64::INFINITY, "test").is_err());
        assert!(check_finite(f64::NAN, "test").is_err());
    }

    #[test]
    fn attribute_parsing() {
        assert_eq!(number("vol", &AttrValue::from(0.2)).unwrap(), 0.2);
        assert!(matches!(
            number("vol", &AttrValue::from(true)),
            Err(ComponentError::AttrType { .. })
        ));
        assert!(matches!(
            positive("r_for", &AttrValue::from(0.0)),
            Err(ComponentError::InvalidValue { .. })
        ));
        assert!(non_negative("vol", &AttrValue::from(0.0)).is_ok());
        assert_eq!(names("x", &AttrValue::from("LA")).unwrap(), vec!["LA"]);
    }

    #[test]
    fn guard_policies() {
        let mut v = -0.1;
        assert!(guard_volume("A", &mut v, VolumeGuard::Abort).is_err());
        assert_eq!(v, -0.1);
        guard_volume("A", &mut v, VolumeGuard::Clamp).unwrap();
        assert_eq!(v, 0.0);
    }
}
