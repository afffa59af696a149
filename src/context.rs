//! Runtime context
//!
//! The Context is the explicit engine state every runtime operation runs
//! against: the heap, the global object, the well-known prototypes, the
//! installed collector and the configuration. Nothing in the runtime is
//! reached through ambient globals.

use crate::config::RuntimeConfig;
use crate::error::{JsError, JsResult};
use crate::gc::{CollectReason, CollectRequest, Collector, GcStats, Heap, HeapStats, NullCollector};
use crate::runtime::function::{CallHook, Function, NativeFn};
use crate::runtime::object::Growth;
use crate::value::{MapRef, ObjRef, StrRef, Value};

/// Well-known prototype objects
#[derive(Debug, Clone, Copy)]
pub(crate) struct Prototypes {
    pub object: ObjRef,
    pub array: ObjRef,
    pub function: ObjRef,
    pub string: ObjRef,
    pub number: ObjRef,
    pub boolean: ObjRef,
}

/// Property names the runtime looks up on its own
#[derive(Debug, Clone, Copy)]
pub(crate) struct Names {
    pub length: StrRef,
    pub callee: StrRef,
    pub to_string: StrRef,
    pub prototype: StrRef,
}

pub struct Context {
    pub(crate) heap: Heap,
    pub(crate) config: RuntimeConfig,
    collector: Box<dyn Collector>,
    gc_stats: GcStats,

    pub(crate) global: ObjRef,
    pub(crate) protos: Prototypes,
    pub(crate) names: Names,

    /// Executor for `Function::Compiled` closures
    call_hook: Option<CallHook>,
}

impl Context {
    /// Create a context with the default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_collector(config, Box::new(NullCollector::new()))
    }

    /// Create a context that hands collection requests to `collector`
    pub fn with_collector(config: RuntimeConfig, collector: Box<dyn Collector>) -> Self {
        let mut heap = Heap::new(config.gc_threshold_words);

        let names = Names {
            length: heap.intern("length"),
            callee: heap.intern("callee"),
            to_string: heap.intern("toString"),
            prototype: heap.intern("prototype"),
        };

        let plain = |heap: &mut Heap, proto: Value| {
            let map = heap.alloc_map();
            heap.new_object(map, proto, &config)
        };
        let object = plain(&mut heap, Value::Null);
        let root = Value::Object(object);
        let protos = Prototypes {
            object,
            array: plain(&mut heap, root),
            function: plain(&mut heap, root),
            string: plain(&mut heap, root),
            number: plain(&mut heap, root),
            boolean: plain(&mut heap, root),
        };
        let global = plain(&mut heap, root);

        let mut ctx = Context {
            heap,
            config,
            collector,
            gc_stats: GcStats::default(),
            global,
            protos,
            names,
            call_hook: None,
        };
        ctx.install_globals();
        // bootstrap allocations never count as a threshold crossing
        ctx.heap.take_gc_pending();
        ctx
    }

    /// Install the collector that receives future requests
    pub fn set_collector(&mut self, collector: Box<dyn Collector>) {
        self.collector = collector;
    }

    /// Install the executor for compiled closures
    pub fn set_call_hook(&mut self, hook: CallHook) {
        self.call_hook = Some(hook);
    }

    #[inline]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    #[inline]
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    // Strings

    /// Find or add a string in the string table
    #[inline]
    pub fn intern(&mut self, s: &str) -> StrRef {
        self.heap.intern(s)
    }

    /// Interned string as a value
    #[inline]
    pub fn new_str(&mut self, s: &str) -> Value {
        Value::Str(self.heap.intern(s))
    }

    #[inline]
    pub fn str(&self, r: StrRef) -> &str {
        self.heap.str(r)
    }

    // Globals

    /// The global object
    #[inline]
    pub fn global(&self) -> ObjRef {
        self.heap.resolve(self.global)
    }

    #[inline]
    pub fn global_value(&self) -> Value {
        Value::Object(self.global())
    }

    /// Check whether `obj` is the global object, through forwarding
    #[inline]
    pub fn is_global(&self, obj: ObjRef) -> bool {
        self.heap.resolve(obj) == self.global()
    }

    pub fn object_prototype(&self) -> ObjRef {
        self.heap.resolve(self.protos.object)
    }

    pub fn array_prototype(&self) -> ObjRef {
        self.heap.resolve(self.protos.array)
    }

    pub fn function_prototype(&self) -> ObjRef {
        self.heap.resolve(self.protos.function)
    }

    pub fn string_prototype(&self) -> ObjRef {
        self.heap.resolve(self.protos.string)
    }

    pub fn number_prototype(&self) -> ObjRef {
        self.heap.resolve(self.protos.number)
    }

    pub fn boolean_prototype(&self) -> ObjRef {
        self.heap.resolve(self.protos.boolean)
    }

    /// Check whether `obj` is one of the built-in root prototypes
    pub(crate) fn is_root_prototype(&self, obj: ObjRef) -> bool {
        let obj = self.heap.resolve(obj);
        obj == self.object_prototype()
            || obj == self.array_prototype()
            || obj == self.function_prototype()
            || obj == self.string_prototype()
    }

    /// Reference identity of two values, resolving forwarded objects
    pub fn same_ref(&self, a: Value, b: Value) -> bool {
        match (a, b) {
            (Value::Object(x), Value::Object(y))
            | (Value::Array(x), Value::Array(y))
            | (Value::Closure(x), Value::Closure(y)) => {
                self.heap.resolve(x) == self.heap.resolve(y)
            }
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Null, Value::Null) => true,
            (Value::RawPtr(x), Value::RawPtr(y)) => x == y,
            _ => false,
        }
    }

    // Allocation

    pub fn new_map(&mut self) -> MapRef {
        self.heap.alloc_map()
    }

    pub fn new_object(&mut self, map: MapRef, proto: Value) -> Value {
        let obj = self.heap.new_object(map, proto, &self.config);
        self.after_alloc();
        Value::Object(obj)
    }

    /// Plain object with its own fresh map and `Object.prototype`
    pub fn new_plain_object(&mut self) -> Value {
        let map = self.heap.alloc_map();
        let proto = Value::Object(self.object_prototype());
        self.new_object(map, proto)
    }

    pub fn new_array(&mut self, map: MapRef, proto: Value, num_elems: u32) -> Value {
        let arr = self.heap.new_array(map, proto, num_elems, &self.config);
        self.after_alloc();
        Value::Array(arr)
    }

    /// Empty array with its own fresh map and `Array.prototype`
    pub fn new_plain_array(&mut self) -> Value {
        let map = self.heap.alloc_map();
        let proto = Value::Object(self.array_prototype());
        let cap = self.config.initial_array_capacity;
        self.new_array(map, proto, cap)
    }

    pub fn new_closure(
        &mut self,
        map: MapRef,
        proto: Value,
        function: Function,
        num_cells: u32,
    ) -> Value {
        let clos = self
            .heap
            .new_closure(map, proto, function, num_cells, &self.config);
        self.after_alloc();
        Value::Closure(clos)
    }

    /// Closure over a native function, with `Function.prototype`
    pub fn new_native_function(&mut self, f: NativeFn) -> Value {
        let map = self.heap.alloc_map();
        let proto = Value::Object(self.function_prototype());
        self.new_closure(map, proto, Function::Native(f), 0)
    }

    // Calls

    /// Call a closure with the given `this` and arguments
    pub fn call(&mut self, callee: Value, this: Value, args: &[Value]) -> JsResult<Value> {
        let Value::Closure(clos) = callee else {
            return Err(JsError::type_error("callee is not a function"));
        };
        let function = self
            .heap
            .closure_data(clos)
            .map(|d| d.function())
            .ok_or(JsError::Internal("closure without closure layout"))?;

        match function {
            Function::Native(f) => f(self, this, args),
            Function::Compiled(id) => match self.call_hook {
                Some(hook) => hook(self, id, clos, this, args),
                None => Err(JsError::type_error("no executor for compiled function")),
            },
        }
    }

    // Collection

    /// Hand a request to the installed collector
    pub fn collect(&mut self, request: CollectRequest) {
        log::debug!(
            "collection requested: {:?} (target {:?}, {} of {} words used)",
            request.reason,
            request.target_size,
            self.heap.used_words(),
            self.heap.heap_size()
        );
        self.gc_stats.record(request.reason);
        self.collector.collect(&mut self.heap, request);
    }

    /// Explicit full collection
    pub fn gc(&mut self) {
        self.collect(CollectRequest::new(CollectReason::Explicit));
    }

    /// Collect, then resize the heap so that exactly `free_space` words
    /// are left free
    pub fn shrink_heap(&mut self, free_space: i64) -> JsResult<()> {
        if free_space <= 0 {
            return Err(JsError::range_error("invalid free space value"));
        }
        self.collect(CollectRequest::new(CollectReason::ShrinkHeap));

        let heap_size = self.heap.heap_size() as i64;
        let heap_free = self.heap.heap_free() as i64;
        let new_size = (heap_size - (heap_free - free_space)).max(0) as usize;
        self.collect(CollectRequest::new(CollectReason::ShrinkHeap).with_target_size(new_size));
        Ok(())
    }

    #[inline]
    pub fn gc_stats(&self) -> GcStats {
        self.gc_stats
    }

    #[inline]
    pub fn stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Ask for a collection if the last allocation crossed the threshold
    pub(crate) fn after_alloc(&mut self) {
        if self.heap.take_gc_pending() {
            self.collect(CollectRequest::new(CollectReason::Threshold));
        }
    }

    /// React to an object growing. Growth of the global object leaves a
    /// large tombstone behind, so it always asks for a collection.
    pub(crate) fn after_growth(&mut self, growth: Growth) {
        if self.is_global(growth.to) {
            self.global = growth.to;
            self.collect(CollectRequest::new(CollectReason::GlobalGrowth));
        }
        #[cfg(feature = "debug-gc")]
        self.collect(CollectRequest::new(CollectReason::Explicit));
        self.after_alloc();
    }

    // Bootstrap

    fn define(&mut self, target: ObjRef, name: &str, val: Value) {
        let name = self.heap.intern(name);
        self.heap.obj_set_prop(target, name, val, &self.config);
    }

    fn define_fn(&mut self, target: ObjRef, name: &str, f: NativeFn) -> Value {
        let map = self.heap.alloc_map();
        let proto = Value::Object(self.protos.function);
        let func = self
            .heap
            .new_closure(map, proto, Function::Native(f), 0, &self.config);
        self.define(target, name, Value::Closure(func));
        Value::Closure(func)
    }

    fn install_globals(&mut self) {
        let p = self.protos;
        self.define_fn(p.object, "toString", object_to_string);
        self.define_fn(p.array, "toString", array_to_string);
        self.define_fn(p.function, "toString", function_to_string);
        self.define_fn(p.string, "toString", string_to_string);
        self.define_fn(p.number, "toString", number_to_string);
        self.define_fn(p.boolean, "toString", boolean_to_string);

        let global = self.global;
        self.define(global, "undefined", Value::Undefined);
        self.define(global, "NaN", Value::Float(f64::NAN));
        self.define(global, "Infinity", Value::Float(f64::INFINITY));
        self.define_fn(global, "isNaN", global_is_nan);

        let ctors: [(&str, NativeFn, ObjRef); 5] = [
            ("Object", object_ctor, p.object),
            ("Array", array_ctor, p.array),
            ("String", string_ctor, p.string),
            ("Number", number_ctor, p.number),
            ("Boolean", boolean_ctor, p.boolean),
        ];
        for (name, f, proto) in ctors {
            let ctor = self.define_fn(global, name, f);
            if let Some(ctor) = ctor.as_obj() {
                self.define(ctor, "prototype", Value::Object(proto));
            }
        }

        let h = &self.heap;
        self.global = h.resolve(self.global);
        self.protos = Prototypes {
            object: h.resolve(p.object),
            array: h.resolve(p.array),
            function: h.resolve(p.function),
            string: h.resolve(p.string),
            number: h.resolve(p.number),
            boolean: h.resolve(p.boolean),
        };
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn arg(args: &[Value], idx: usize) -> Value {
    args.get(idx).copied().unwrap_or(Value::Undefined)
}

// Native toString capabilities

fn object_to_string(ctx: &mut Context, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(ctx.new_str("[object Object]"))
}

fn array_to_string(ctx: &mut Context, this: Value, _args: &[Value]) -> JsResult<Value> {
    let Value::Array(arr) = this else {
        return Ok(ctx.new_str("[object Object]"));
    };
    let mut out = String::new();
    for i in 0..ctx.heap.arr_len(arr) {
        if i > 0 {
            out.push(',');
        }
        let elem = ctx.heap.get_arr_elem(arr, i);
        if !matches!(elem, Value::Undefined | Value::Null) {
            let s = ctx.to_string(elem)?;
            out.push_str(ctx.str(s));
        }
    }
    Ok(ctx.new_str(&out))
}

fn function_to_string(ctx: &mut Context, this: Value, _args: &[Value]) -> JsResult<Value> {
    let text = match this {
        Value::Closure(clos) => match ctx.heap.closure_data(clos).map(|d| d.function()) {
            Some(Function::Compiled(id)) => format!("function f{}() {{ [compiled code] }}", id),
            _ => "function () { [native code] }".to_owned(),
        },
        _ => return Err(JsError::type_error("Function.prototype.toString on non-function")),
    };
    Ok(ctx.new_str(&text))
}

fn string_to_string(_ctx: &mut Context, this: Value, _args: &[Value]) -> JsResult<Value> {
    match this {
        Value::Str(_) => Ok(this),
        _ => Err(JsError::type_error("String.prototype.toString on non-string")),
    }
}

fn number_to_string(ctx: &mut Context, this: Value, args: &[Value]) -> JsResult<Value> {
    if !this.is_number() {
        return Err(JsError::type_error("Number.prototype.toString on non-number"));
    }
    let radix = arg(args, 0).to_i32().unwrap_or(10);
    let s = ctx.number_to_string(this, radix)?;
    Ok(Value::Str(s))
}

fn boolean_to_string(ctx: &mut Context, this: Value, _args: &[Value]) -> JsResult<Value> {
    match this {
        Value::Bool(b) => Ok(ctx.new_str(if b { "true" } else { "false" })),
        _ => Err(JsError::type_error("Boolean.prototype.toString on non-boolean")),
    }
}

// Global functions

fn global_is_nan(ctx: &mut Context, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Bool(ctx.is_nan(arg(args, 0))?))
}

fn object_ctor(ctx: &mut Context, _this: Value, args: &[Value]) -> JsResult<Value> {
    let v = arg(args, 0);
    if v.is_object_like() {
        return Ok(v);
    }
    Ok(ctx.new_plain_object())
}

fn array_ctor(ctx: &mut Context, _this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = ctx.new_plain_array();
    let Some(obj) = arr.as_obj() else {
        return Err(JsError::Internal("array allocation returned non-array"));
    };
    match args {
        [Value::Int(n)] => {
            let len = u32::try_from(*n).map_err(|_| JsError::range_error("invalid array length"))?;
            ctx.heap.set_arr_len(obj, len, &ctx.config)?;
        }
        _ => {
            for (i, &v) in args.iter().enumerate() {
                ctx.heap.set_arr_elem(obj, i as u32, v, &ctx.config)?;
            }
        }
    }
    Ok(arr)
}

fn string_ctor(ctx: &mut Context, _this: Value, args: &[Value]) -> JsResult<Value> {
    if args.is_empty() {
        return Ok(ctx.new_str(""));
    }
    Ok(Value::Str(ctx.to_string(args[0])?))
}

fn number_ctor(ctx: &mut Context, _this: Value, args: &[Value]) -> JsResult<Value> {
    if args.is_empty() {
        return Ok(Value::Int(0));
    }
    ctx.to_number(args[0])
}

fn boolean_ctor(ctx: &mut Context, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Bool(ctx.to_boolean(arg(args, 0))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_create_context() {
        let ctx = Context::new();
        let stats = ctx.stats();
        assert!(stats.objects > 0);
        assert_eq!(ctx.gc_stats(), GcStats::default());
        assert_ne!(ctx.global(), ctx.object_prototype());
    }

    #[test]
    fn test_globals_installed() {
        let mut ctx = Context::new();
        let global = ctx.global_value();
        let nan = ctx.new_str("NaN");
        assert!(ctx.get_prop(global, nan).unwrap().is_nan());
        let undef = ctx.new_str("undefined");
        assert_eq!(ctx.get_prop(global, undef).unwrap(), Value::Undefined);
        let object = ctx.new_str("Object");
        assert!(ctx.get_prop(global, object).unwrap().is_closure());
    }

    #[test]
    fn test_call_native() {
        let mut ctx = Context::new();
        let global = ctx.global_value();
        let is_nan = ctx.new_str("isNaN");
        let f = ctx.get_prop(global, is_nan).unwrap();
        let abc = ctx.new_str("abc");
        assert_eq!(ctx.call(f, Value::Undefined, &[abc]).unwrap(), Value::Bool(true));
        assert_eq!(
            ctx.call(f, Value::Undefined, &[Value::Int(1)]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_call_non_function() {
        let mut ctx = Context::new();
        let err = ctx.call(Value::Int(1), Value::Undefined, &[]).unwrap_err();
        assert!(err.is_type_error());
    }

    fn run_compiled(
        _ctx: &mut Context,
        func: u32,
        _callee: ObjRef,
        _this: Value,
        args: &[Value],
    ) -> JsResult<Value> {
        Ok(Value::Int(func as i32 + args.len() as i32))
    }

    #[test]
    fn test_call_hook() {
        let mut ctx = Context::new();
        let map = ctx.new_map();
        let proto = Value::Object(ctx.function_prototype());
        let f = ctx.new_closure(map, proto, Function::Compiled(40), 0);
        assert!(ctx.call(f, Value::Undefined, &[]).unwrap_err().is_type_error());
        ctx.set_call_hook(run_compiled);
        assert_eq!(
            ctx.call(f, Value::Undefined, &[Value::Null, Value::Null]).unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn test_thrown_value_propagates() {
        fn thrower(_ctx: &mut Context, _this: Value, args: &[Value]) -> JsResult<Value> {
            Err(JsError::Thrown(arg(args, 0)))
        }
        let mut ctx = Context::new();
        let f = ctx.new_native_function(thrower);
        match ctx.call(f, Value::Undefined, &[Value::Int(7)]) {
            Err(JsError::Thrown(v)) => assert_eq!(v, Value::Int(7)),
            other => panic!("expected thrown value, got {:?}", other),
        }
    }

    struct Recording(Rc<RefCell<Vec<CollectRequest>>>);

    impl Collector for Recording {
        fn collect(&mut self, _heap: &mut Heap, request: CollectRequest) {
            self.0.borrow_mut().push(request);
        }
    }

    #[test]
    fn test_global_growth_requests_collection() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = Context::new();
        ctx.set_collector(Box::new(Recording(log.clone())));
        let global = ctx.global_value();
        let before = ctx.global();
        for i in 0..8 {
            let name = ctx.new_str(&format!("g{}", i));
            ctx.set_prop(global, name, Value::Int(i)).unwrap();
        }
        assert_ne!(ctx.global(), before);
        assert!(ctx.is_global(before));
        assert!(!ctx.is_global(ctx.object_prototype()));
        assert!(ctx.gc_stats().global_growths > 0);
        assert!(log
            .borrow()
            .iter()
            .any(|r| r.reason == CollectReason::GlobalGrowth));
    }

    #[test]
    fn test_plain_growth_does_not_request_collection() {
        let mut ctx = Context::new();
        let obj = ctx.new_plain_object();
        for i in 0..40 {
            let name = ctx.new_str(&format!("p{}", i));
            ctx.set_prop(obj, name, Value::Int(i)).unwrap();
        }
        assert_eq!(ctx.gc_stats().global_growths, 0);
    }

    #[test]
    fn test_threshold_request() {
        let cfg = RuntimeConfig::default().with_gc_threshold_words(1);
        let mut ctx = Context::with_config(cfg);
        assert_eq!(ctx.gc_stats().threshold_crossings, 0);
        ctx.new_plain_object();
        assert_eq!(ctx.gc_stats().threshold_crossings, 1);
    }

    #[test]
    fn test_initial_array_capacity() {
        let cfg = RuntimeConfig::default().with_initial_array_capacity(16);
        let mut ctx = Context::with_config(cfg);
        let arr = ctx.new_plain_array();
        let r = arr.as_obj().unwrap();
        assert_eq!(ctx.heap().arr_capacity(r), 16);
        assert_eq!(ctx.heap().arr_len(r), 0);
        ctx.set_prop(arr, Value::Int(15), Value::Int(1)).unwrap();
        assert_eq!(ctx.heap().arr_capacity(r), 16);
    }

    #[test]
    fn test_shrink_heap() {
        let mut ctx = Context::new();
        assert!(ctx.shrink_heap(0).unwrap_err().is_range_error());
        ctx.shrink_heap(128).unwrap();
        assert_eq!(ctx.heap().heap_free(), 128);
        assert_eq!(ctx.gc_stats().shrinks, 2);
    }

    #[test]
    fn test_same_ref_through_forwarding() {
        let mut ctx = Context::new();
        let obj = ctx.new_plain_object();
        let name = ctx.new_str("x");
        ctx.set_prop(obj, name, Value::Int(1)).unwrap();
        let live = Value::Object(ctx.heap().resolve(obj.as_obj().unwrap()));
        assert_ne!(obj, live);
        assert!(ctx.same_ref(obj, live));
        assert!(!ctx.same_ref(obj, Value::Null));
    }
}
