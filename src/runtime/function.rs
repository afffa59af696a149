//! Closures and cells
//!
//! A closure is an object instance whose layout carries the function it
//! runs and a fixed vector of cells. A cell boxes one captured variable;
//! closures that capture the same variable hold the same [`CellRef`], so a
//! write through one is seen by all of them.

use crate::config::RuntimeConfig;
use crate::context::Context;
use crate::error::{JsError, JsResult};
use crate::gc::Heap;
use crate::runtime::object::{JsObject, Layout};
use crate::value::{CellRef, MapRef, ObjRef, Value};

/// Native function signature
///
/// Native functions take the context, the `this` value and the arguments.
pub type NativeFn = fn(ctx: &mut Context, this: Value, args: &[Value]) -> JsResult<Value>;

/// Executor for compiled functions, installed by the embedding engine
///
/// Receives the function id, the closure being called, `this` and the
/// arguments.
pub type CallHook =
    fn(ctx: &mut Context, func: u32, callee: ObjRef, this: Value, args: &[Value]) -> JsResult<Value>;

/// What a closure runs when called
#[derive(Clone, Copy)]
pub enum Function {
    Native(NativeFn),
    /// Compiled function, identified by the engine's function id
    Compiled(u32),
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Function::Native(_) => write!(f, "Native"),
            Function::Compiled(id) => write!(f, "Compiled({})", id),
        }
    }
}

/// Closure-specific part of an object layout
#[derive(Debug, Clone)]
pub struct ClosureData {
    pub(crate) function: Function,
    pub(crate) cells: Vec<CellRef>,
}

impl ClosureData {
    #[inline]
    pub fn function(&self) -> Function {
        self.function
    }

    #[inline]
    pub fn cells(&self) -> &[CellRef] {
        &self.cells
    }
}

impl Heap {
    /// Allocate a closure with `num_cells` fresh cells
    pub fn new_closure(
        &mut self,
        map: MapRef,
        proto: Value,
        function: Function,
        num_cells: u32,
        cfg: &RuntimeConfig,
    ) -> ObjRef {
        let cells = (0..num_cells).map(|_| self.make_cell()).collect();
        let cap = self.map(map).num_props().max(cfg.min_object_capacity);
        let layout = Layout::Closure(ClosureData { function, cells });
        self.alloc_object(JsObject::new(map, proto, cap, layout))
    }

    /// Closure part of a live instance, `None` for non-closures
    pub fn closure_data(&self, clos: ObjRef) -> Option<&ClosureData> {
        match &self.object(clos).layout {
            Layout::Closure(data) => Some(data),
            _ => None,
        }
    }

    /// Allocate a cell holding undefined
    #[inline]
    pub fn make_cell(&mut self) -> CellRef {
        self.alloc_cell()
    }

    #[inline]
    pub fn get_cell_val(&self, cell: CellRef) -> Value {
        self.cell(cell).to_value().unwrap_or(Value::Undefined)
    }

    #[inline]
    pub fn set_cell_val(&mut self, cell: CellRef, val: Value) {
        self.set_cell(cell, val.to_raw());
    }

    pub fn num_cells(&self, clos: ObjRef) -> u32 {
        self.closure_data(clos).map_or(0, |d| d.cells.len() as u32)
    }

    /// Cell captured at `idx`
    pub fn clos_get_cell(&self, clos: ObjRef, idx: u32) -> JsResult<CellRef> {
        self.closure_data(clos)
            .and_then(|d| d.cells.get(idx as usize).copied())
            .ok_or(JsError::Internal("closure cell index out of range"))
    }

    /// Point the cell at `idx` to an existing cell, sharing it
    pub fn clos_set_cell(&mut self, clos: ObjRef, idx: u32, cell: CellRef) -> JsResult<()> {
        match &mut self.object_mut(clos).layout {
            Layout::Closure(data) => match data.cells.get_mut(idx as usize) {
                Some(slot) => {
                    *slot = cell;
                    Ok(())
                }
                None => Err(JsError::Internal("closure cell index out of range")),
            },
            _ => Err(JsError::Internal("cell access on non-closure")),
        }
    }
}
