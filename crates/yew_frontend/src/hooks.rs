//! Liveness tracking for async continuations
//!
//! A component hands a [`LiveToken`] to each task it spawns. Unmounting (or
//! an explicit reset) invalidates every outstanding token, and tasks check
//! their token before touching state.

use std::cell::Cell;
use std::rc::Rc;
use yew::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct Liveness(Rc<Cell<u64>>);

impl PartialEq for Liveness {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Liveness {
    pub fn token(&self) -> LiveToken {
        LiveToken {
            generation: self.0.get(),
            current: Rc::clone(&self.0),
        }
    }

    pub fn invalidate(&self) {
        self.0.set(self.0.get().wrapping_add(1));
    }
}

#[derive(Debug, Clone)]
pub struct LiveToken {
    generation: u64,
    current: Rc<Cell<u64>>,
}

impl LiveToken {
    pub fn is_live(&self) -> bool {
        self.current.get() == self.generation
    }
}

/// [`Liveness`] that is invalidated when the component unmounts
#[hook]
pub fn use_liveness() -> Liveness {
    let liveness = (*use_memo((), |_| Liveness::default())).clone();
    {
        let liveness = liveness.clone();
        use_effect_with((), move |_| move || liveness.invalidate());
    }
    liveness
}
