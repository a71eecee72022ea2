//! Controllers stored in an arena and addressed by stable integer handles.
//!
//! Controllers are built in two phases: every name is first declared, which
//! hands out a [`ControllerId`], and only then are bodies bound. Bodies refer
//! to their successors by id, so mutually recursive controllers need no
//! back-pointers.

use crate::data::{DataState, DataStateUpdate};
use crate::error::{Error, Result};
use rand::RngCore;
use std::{collections::HashMap, fmt, sync::Arc};

/// Stable handle into a [`ControllerTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerId(usize);

/// Behaviour of a controller for one step: the updates to apply and the
/// controller in charge of the next step.
pub type ControllerBody =
    Arc<dyn Fn(&mut dyn RngCore, &DataState) -> (Vec<DataStateUpdate>, ControllerId) + Send + Sync>;

#[derive(Default)]
pub struct ControllerRegistry {
    names: Vec<String>,
    ids: HashMap<String, ControllerId>,
    bodies: Vec<Option<ControllerBody>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a handle for `name`. Declaring the same name twice returns the same id.
    pub fn declare(&mut self, name: &str) -> ControllerId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = ControllerId(self.names.len());
        self.names.push(name.to_string());
        self.bodies.push(None);
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Look up a declared controller.
    pub fn reference(&self, name: &str) -> Result<ControllerId> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownReference {
                kind: "controller",
                name: name.to_string(),
            })
    }

    pub fn bind<F>(&mut self, id: ControllerId, body: F) -> Result<()>
    where
        F: Fn(&mut dyn RngCore, &DataState) -> (Vec<DataStateUpdate>, ControllerId)
            + Send
            + Sync
            + 'static,
    {
        let slot = self.bodies.get_mut(id.0).ok_or_else(|| {
            Error::InvalidParameter(format!("controller id {} was not issued here", id.0))
        })?;
        *slot = Some(Arc::new(body));
        Ok(())
    }

    /// Freeze the registry. Fails if some declared controller has no body.
    pub fn build(self) -> Result<Arc<ControllerTable>> {
        let mut bodies = Vec::with_capacity(self.bodies.len());
        for (name, body) in self.names.iter().zip(self.bodies) {
            bodies.push(body.ok_or_else(|| Error::UnboundController(name.clone()))?);
        }
        Ok(Arc::new(ControllerTable {
            names: self.names,
            bodies,
        }))
    }
}

/// Immutable arena of controller bodies.
pub struct ControllerTable {
    names: Vec<String>,
    bodies: Vec<ControllerBody>,
}

impl ControllerTable {
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Name of controller `id`, if it belongs to this table.
    pub fn name(&self, id: ControllerId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    fn body(&self, id: ControllerId) -> Result<&ControllerBody> {
        self.bodies.get(id.0).ok_or_else(|| Error::UnknownReference {
            kind: "controller",
            name: format!("#{}", id.0),
        })
    }

    /// Handle to the controller `id` of this table.
    pub fn controller(self: &Arc<Self>, id: ControllerId) -> Result<Controller> {
        if id.0 >= self.bodies.len() {
            return Err(Error::InvalidParameter(format!(
                "controller id {} is out of range",
                id.0
            )));
        }
        Ok(Controller {
            table: Arc::clone(self),
            id,
        })
    }
}

/// A controller in a running system: a table plus the current handle.
#[derive(Clone)]
pub struct Controller {
    table: Arc<ControllerTable>,
    id: ControllerId,
}

impl Controller {
    /// A single-state controller that always applies `body` and stays in charge.
    pub fn from_fn<F>(body: F) -> Self
    where
        F: Fn(&mut dyn RngCore, &DataState) -> Vec<DataStateUpdate> + Send + Sync + 'static,
    {
        let id = ControllerId(0);
        let body: ControllerBody = Arc::new(move |rng, state| (body(rng, state), id));
        Self {
            table: Arc::new(ControllerTable {
                names: vec!["main".to_string()],
                bodies: vec![body],
            }),
            id,
        }
    }

    /// A controller that never changes anything.
    pub fn idle() -> Self {
        Self::from_fn(|_, _| Vec::new())
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.table.name(self.id).unwrap_or_default()
    }

    /// Run one step of the controller.
    ///
    /// Fails if the body hands over to an id that was not issued by the
    /// registry this controller was built from.
    pub fn next(
        &self,
        rng: &mut dyn RngCore,
        state: &DataState,
    ) -> Result<(Vec<DataStateUpdate>, Self)> {
        let (updates, next_id) = (self.table.body(self.id)?)(rng, state);
        self.table.body(next_id)?;
        let next = Self {
            table: Arc::clone(&self.table),
            id: next_id,
        };
        Ok((updates, next))
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name())
            .finish()
    }
}
