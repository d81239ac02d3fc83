//! Dependency pool and publish-once curve registry.
//!
//! Builders look up the curves they depend on through [`CurveLookup`].
//! [`DependencyPool`] is a plain map filled by the caller before a build;
//! [`CurveRegistry`] hands out [`CurveHandle`]s up front and lets each
//! curve be published exactly once.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{CurveError, CurveResult};
use crate::termstructures::{DefaultTermStructure, YieldTermStructure};

/// A credit curve with its recovery rate.
#[derive(Clone)]
pub struct DefaultCurveEntry {
    /// Survival curve.
    pub curve: Arc<dyn DefaultTermStructure>,
    /// Recovery rate.
    pub recovery_rate: f64,
}

impl fmt::Debug for DefaultCurveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCurveEntry")
            .field("reference_date", &self.curve.reference_date())
            .field("recovery_rate", &self.recovery_rate)
            .finish()
    }
}

/// Read access to already built curves.
pub trait CurveLookup: Send + Sync {
    /// Yield curve by pool key, e.g. `Yield/EUR/EUR-ESTER`.
    fn yield_curve(&self, name: &str) -> Option<Arc<dyn YieldTermStructure>>;

    /// Default curve by name.
    fn default_curve(&self, name: &str) -> Option<DefaultCurveEntry>;
}

/// Curves supplied by the caller.
#[derive(Clone, Default)]
pub struct DependencyPool {
    yield_curves: BTreeMap<String, Arc<dyn YieldTermStructure>>,
    default_curves: BTreeMap<String, DefaultCurveEntry>,
}

impl fmt::Debug for DependencyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyPool")
            .field("yield_curves", &self.yield_curves.keys().collect::<Vec<_>>())
            .field("default_curves", &self.default_curves.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DependencyPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a yield curve.
    pub fn insert_yield_curve(&mut self, name: impl Into<String>, curve: Arc<dyn YieldTermStructure>) {
        self.yield_curves.insert(name.into(), curve);
    }

    /// Builder-style [`insert_yield_curve`](Self::insert_yield_curve).
    #[must_use]
    pub fn with_yield_curve(mut self, name: impl Into<String>, curve: Arc<dyn YieldTermStructure>) -> Self {
        self.insert_yield_curve(name, curve);
        self
    }

    /// Adds a default curve.
    pub fn insert_default_curve(&mut self, name: impl Into<String>, entry: DefaultCurveEntry) {
        self.default_curves.insert(name.into(), entry);
    }

    /// Builder-style [`insert_default_curve`](Self::insert_default_curve).
    #[must_use]
    pub fn with_default_curve(mut self, name: impl Into<String>, entry: DefaultCurveEntry) -> Self {
        self.insert_default_curve(name, entry);
        self
    }
}

impl CurveLookup for DependencyPool {
    fn yield_curve(&self, name: &str) -> Option<Arc<dyn YieldTermStructure>> {
        self.yield_curves.get(name).cloned()
    }

    fn default_curve(&self, name: &str) -> Option<DefaultCurveEntry> {
        self.default_curves.get(name).cloned()
    }
}

type Slot = Arc<RwLock<Option<Arc<dyn YieldTermStructure>>>>;

/// A stable reference to a curve that may not be built yet.
#[derive(Clone)]
pub struct CurveHandle {
    name: String,
    slot: Slot,
}

impl fmt::Debug for CurveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveHandle")
            .field("name", &self.name)
            .field("linked", &self.is_linked())
            .finish()
    }
}

impl CurveHandle {
    /// Pool key of the curve.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The published curve, if any.
    pub fn current(&self) -> Option<Arc<dyn YieldTermStructure>> {
        self.slot.read().clone()
    }

    /// True once the curve has been published.
    pub fn is_linked(&self) -> bool {
        self.slot.read().is_some()
    }
}

/// Curves published by completed builds. Each name links once.
#[derive(Default)]
pub struct CurveRegistry {
    slots: DashMap<String, Slot>,
    default_curves: DashMap<String, DefaultCurveEntry>,
}

impl fmt::Debug for CurveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveRegistry")
            .field("slots", &self.slots.len())
            .field("default_curves", &self.default_curves.len())
            .finish()
    }
}

impl CurveRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Slot {
        self.slots
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(None)))
            .clone()
    }

    /// Handle to a curve, published or not.
    pub fn handle(&self, name: &str) -> CurveHandle {
        CurveHandle {
            name: name.to_string(),
            slot: self.slot(name),
        }
    }

    /// Links `name` to `curve`.
    ///
    /// # Errors
    ///
    /// Fails if the name was already published.
    pub fn publish(&self, name: &str, curve: Arc<dyn YieldTermStructure>) -> CurveResult<()> {
        let slot = self.slot(name);
        let mut guard = slot.write();
        if guard.is_some() {
            return Err(CurveError::configuration(format!(
                "Curve {name} is already published and cannot be relinked"
            )));
        }
        *guard = Some(curve);
        debug!("Published curve {}", name);
        Ok(())
    }

    /// Registers a default curve, replacing any earlier entry.
    pub fn publish_default_curve(&self, name: &str, entry: DefaultCurveEntry) {
        self.default_curves.insert(name.to_string(), entry);
    }

    /// Number of published yield curves.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value().read().is_some()).count()
    }

    /// True if nothing is published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CurveLookup for CurveRegistry {
    fn yield_curve(&self, name: &str) -> Option<Arc<dyn YieldTermStructure>> {
        self.slots.get(name).and_then(|s| s.value().read().clone())
    }

    fn default_curve(&self, name: &str) -> Option<DefaultCurveEntry> {
        self.default_curves.get(name).map(|e| e.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termstructures::FlatForward;
    use pillar_core::daycounts::DayCountConvention;
    use pillar_core::Date;

    fn flat(rate: f64) -> Arc<dyn YieldTermStructure> {
        Arc::new(FlatForward::new(
            Date::from_ymd(2024, 1, 15).unwrap(),
            rate,
            DayCountConvention::Act365Fixed,
        ))
    }

    #[test]
    fn test_publish_once() {
        let registry = CurveRegistry::new();
        let handle = registry.handle("Yield/EUR/EUR-ESTER");
        assert!(!handle.is_linked());
        assert!(registry.yield_curve("Yield/EUR/EUR-ESTER").is_none());

        registry.publish("Yield/EUR/EUR-ESTER", flat(0.03)).unwrap();
        assert!(handle.is_linked());
        assert_eq!(registry.len(), 1);

        let err = registry.publish("Yield/EUR/EUR-ESTER", flat(0.04)).unwrap_err();
        assert!(matches!(err, CurveError::Configuration { .. }));
        let current = handle.current().unwrap();
        assert!((current.discount(1.0).unwrap() - (-0.03f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn test_pool_lookup() {
        let pool = DependencyPool::new().with_yield_curve("Yield/USD/USD-SOFR", flat(0.05));
        assert!(pool.yield_curve("Yield/USD/USD-SOFR").is_some());
        assert!(pool.yield_curve("Yield/USD/USD-LIBOR-3M").is_none());
        assert!(pool.default_curve("ACME").is_none());
    }
}
