//! Partial-update helpers.
//!
//! Update flows mutate the loaded entity field by field and then save the
//! whole record; omitted request fields must leave the persisted value
//! untouched. These helpers encode that rule once.

/// Overwrite `target` only when a value was supplied.
pub fn set_if_some<T>(value: Option<T>, target: &mut T) {
    if let Some(v) = value {
        *target = v;
    }
}

/// Overwrite `target` only when a non-blank string was supplied.
pub fn set_if_not_blank(value: Option<String>, target: &mut String) {
    if let Some(v) = value {
        if !v.trim().is_empty() {
            *target = v;
        }
    }
}
