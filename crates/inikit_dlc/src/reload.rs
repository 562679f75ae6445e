//! Notifying config consumers after an overlay changes their sections.

use std::collections::BTreeSet;

use tracing::debug;

/// The classes and per-object instances whose config sections were touched
/// by an install or a clear.
///
/// Section names of the form `<instance> <class>` (first space delimits)
/// contribute an instance entry; any other section name contributes a class
/// entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadSet {
    pub classes: BTreeSet<String>,
    /// `(instance, class)` pairs.
    pub instances: BTreeSet<(String, String)>,
}

impl ReloadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a touched section name into the set.
    pub fn note_section(&mut self, name: &str) {
        match name.split_once(' ') {
            Some((instance, class)) => {
                self.instances
                    .insert((instance.to_string(), class.to_string()));
            }
            None => {
                self.classes.insert(name.to_string());
            }
        }
    }

    pub fn merge(&mut self, other: ReloadSet) {
        self.classes.extend(other.classes);
        self.instances.extend(other.instances);
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.instances.is_empty()
    }

    /// Whether anything in this set concerns `class_name`.
    pub fn concerns_class(&self, class_name: &str) -> bool {
        self.classes.iter().any(|c| c.eq_ignore_ascii_case(class_name))
            || self
                .instances
                .iter()
                .any(|(_, c)| c.eq_ignore_ascii_case(class_name))
    }
}

/// A config consumer that wants to re-read its values when its class's
/// sections change.
pub trait ReloadHandler {
    /// The class section name this handler listens for.
    fn class_name(&self) -> &str;

    /// Re-read configuration. Called once per dispatch however many of the
    /// class's sections changed.
    fn reload(&mut self, changes: &ReloadSet);
}

/// Fan-out of [`ReloadSet`]s to registered handlers.
#[derive(Default)]
pub struct ReloadDispatcher {
    handlers: Vec<Box<dyn ReloadHandler>>,
}

impl ReloadDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn ReloadHandler>) {
        self.handlers.push(handler);
    }

    /// Notify every handler whose class appears in `changes`. Returns how
    /// many handlers fired.
    pub fn dispatch(&mut self, changes: &ReloadSet) -> usize {
        if changes.is_empty() {
            return 0;
        }
        let mut fired = 0;
        for handler in &mut self.handlers {
            if changes.concerns_class(handler.class_name()) {
                debug!("reloading config consumers of {}", handler.class_name());
                handler.reload(changes);
                fired += 1;
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counter {
        class: String,
        count: Rc<Cell<usize>>,
    }

    impl ReloadHandler for Counter {
        fn class_name(&self) -> &str {
            &self.class
        }
        fn reload(&mut self, _changes: &ReloadSet) {
            self.count.set(self.count.get() + 1);
        }
    }

    #[test]
    fn test_note_section_classifies() {
        let mut set = ReloadSet::new();
        set.note_section("Engine.Engine");
        set.note_section("Rifle Weapon");
        assert!(set.classes.contains("Engine.Engine"));
        assert!(set
            .instances
            .contains(&("Rifle".to_string(), "Weapon".to_string())));
    }

    #[test]
    fn test_dispatch_fires_matching_handlers() {
        let weapon = Rc::new(Cell::new(0));
        let hud = Rc::new(Cell::new(0));
        let mut dispatcher = ReloadDispatcher::new();
        dispatcher.register(Box::new(Counter {
            class: "Weapon".to_string(),
            count: Rc::clone(&weapon),
        }));
        dispatcher.register(Box::new(Counter {
            class: "Hud".to_string(),
            count: Rc::clone(&hud),
        }));

        let mut changes = ReloadSet::new();
        changes.note_section("Rifle Weapon");
        assert_eq!(dispatcher.dispatch(&changes), 1);
        assert_eq!(weapon.get(), 1);
        assert_eq!(hud.get(), 0);

        assert_eq!(dispatcher.dispatch(&ReloadSet::new()), 0);
    }
}
