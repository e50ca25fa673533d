use std::fmt;
use std::rc::Rc;

use colored::Colorize;
use rustc_hash::FxHashMap;
use z3::ast::{Array, Ast, Bool, Int, BV};
use z3::{Context, Sort};

use crate::executor::error::{SymbolicError, SymbolicResult};
use crate::executor::symbolic_value::SymbolicValue;
use crate::program::Type;

const ARRAY_LENGTH_WIDTH: u32 = 64;

/// An address inside one memory line. `0` is reserved for nil.
#[derive(Clone, Debug)]
pub enum Address<'ctx> {
    Concrete(i64),
    Symbolic(Int<'ctx>),
}

impl<'ctx> Address<'ctx> {
    pub fn nil() -> Self {
        Address::Concrete(0)
    }

    /// Wraps an integer term, folding it to a concrete address when the
    /// simplifier reduces it to a numeral.
    pub fn from_int(int: Int<'ctx>) -> Self {
        let simplified = int.simplify();
        match simplified.as_i64() {
            Some(v) => Address::Concrete(v),
            None => Address::Symbolic(simplified),
        }
    }

    pub fn to_int(&self, ctx: &'ctx Context) -> Int<'ctx> {
        match self {
            Address::Concrete(v) => Int::from_i64(ctx, *v),
            Address::Symbolic(int) => int.clone(),
        }
    }

    pub fn as_concrete(&self) -> Option<i64> {
        match self {
            Address::Concrete(v) => Some(*v),
            Address::Symbolic(int) => int.simplify().as_i64(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Address::Concrete(0))
    }

    /// The assumption under which dereferencing this address cannot fault.
    /// Concrete addresses need none, nil can never be dereferenced.
    pub fn non_nil(&self, ctx: &'ctx Context) -> Option<Bool<'ctx>> {
        match self {
            Address::Concrete(0) => Some(Bool::from_bool(ctx, false)),
            Address::Concrete(_) => None,
            Address::Symbolic(int) => Some(int._eq(&Int::from_i64(ctx, 0)).not()),
        }
    }
}

impl fmt::Display for Address<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Concrete(0) => write!(f, "nil"),
            Address::Concrete(v) => write!(f, "#{}", v),
            Address::Symbolic(int) => write!(f, "{}", int),
        }
    }
}

/// Identifies a field line: field `index` of structure `structure`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FieldRef {
    pub structure: String,
    pub index: usize,
}

/// A typed reference into symbolic memory.
///
/// A pointer with `field == None` designates an object of type `pointee`.
/// Structs and arrays are objects in their own right, so such a pointer
/// *is* the struct or array reference. A pointer with `field` set
/// designates one field slot of a struct and reads through that field's
/// own line.
#[derive(Clone, Debug)]
pub struct Pointer<'ctx> {
    pub address: Address<'ctx>,
    pub pointee: Type,
    pub field: Option<FieldRef>,
}

impl<'ctx> Pointer<'ctx> {
    pub fn new(address: Address<'ctx>, pointee: Type) -> Self {
        Pointer {
            address,
            pointee,
            field: None,
        }
    }

    pub fn nil(pointee: Type) -> Self {
        Pointer::new(Address::nil(), pointee)
    }

    /// The tag of the memory line this pointer indexes.
    pub fn sort_tag(&self) -> String {
        match &self.field {
            Some(f) => field_key(&f.structure, f.index),
            None => cell_key(&self.pointee),
        }
    }

    /// The declared type of a variable holding this pointer.
    pub fn declared_type(&self) -> Type {
        match &self.pointee {
            Type::Struct { .. } | Type::Array { .. } if self.field.is_none() => {
                self.pointee.clone()
            }
            other => Type::pointer(other.clone()),
        }
    }

    /// Pointer equality: pointers into different lines are never equal,
    /// whatever their addresses.
    pub fn equals(&self, ctx: &'ctx Context, other: &Pointer<'ctx>) -> SymbolicValue<'ctx> {
        if self.sort_tag() != other.sort_tag() {
            return SymbolicValue::ConstantBool(false);
        }
        match (&self.address, &other.address) {
            (Address::Concrete(a), Address::Concrete(b)) => SymbolicValue::ConstantBool(a == b),
            (a, b) => SymbolicValue::SymbolicBool(a.to_int(ctx)._eq(&b.to_int(ctx))),
        }
    }

    pub fn lookup_fmt(&self) -> String {
        format!(
            "{}{}",
            format!("&{}", self.sort_tag()).magenta(),
            format!("@{}", self.address).bright_magenta()
        )
    }
}

impl fmt::Display for Pointer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}@{}", self.sort_tag(), self.address)
    }
}

#[derive(Clone, Debug)]
pub struct MemoryLine<'ctx> {
    /// Contents before the analysed function started; input objects live here.
    pub initial: Array<'ctx>,
    pub current: Array<'ctx>,
}

/// Address-free heap: one solver array per type tag.
///
/// Lines and struct descriptors sit behind `Rc` so that forking a state
/// shares them until one side writes.
#[derive(Clone)]
pub struct SymbolicMemory<'ctx> {
    ctx: &'ctx Context,
    lines: Rc<FxHashMap<String, MemoryLine<'ctx>>>,
    structs: Rc<FxHashMap<String, Vec<Type>>>,
    next_address: i64,
}

fn cell_key(ty: &Type) -> String {
    format!("mem!{}", ty.tag())
}

fn field_key(structure: &str, index: usize) -> String {
    format!("field!{}!{}", structure, index)
}

fn array_data_key(elem: &Type) -> String {
    format!("field![]{}!data", elem.tag())
}

fn array_len_key(elem: &Type) -> String {
    format!("field![]{}!len", elem.tag())
}

fn array_slots_key(elem: &Type) -> String {
    format!("array-{}", elem.tag())
}

fn sort_of<'ctx>(ctx: &'ctx Context, ty: &Type) -> Sort<'ctx> {
    match ty {
        Type::Int { width } => Sort::bitvector(ctx, *width),
        Type::Float { .. } => Sort::real(ctx),
        Type::Bool => Sort::bool(ctx),
        _ => Sort::int(ctx),
    }
}

fn index_term<'ctx>(ctx: &'ctx Context, index: &SymbolicValue<'ctx>) -> SymbolicResult<Int<'ctx>> {
    match index.as_int(ctx, ARRAY_LENGTH_WIDTH)? {
        SymbolicValue::ConstantInt(v, _) => Ok(Int::from_i64(ctx, v)),
        other => Ok(other.to_bv(ctx)?.to_int(true)),
    }
}

fn length_bounds<'ctx>(ctx: &'ctx Context, length: &BV<'ctx>, max_len: usize) -> Vec<Bool<'ctx>> {
    vec![
        length.bvsge(&BV::from_i64(ctx, 0, ARRAY_LENGTH_WIDTH)),
        length.bvsle(&BV::from_i64(ctx, max_len as i64, ARRAY_LENGTH_WIDTH)),
    ]
}

impl<'ctx> SymbolicMemory<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        SymbolicMemory {
            ctx,
            lines: Rc::new(FxHashMap::default()),
            structs: Rc::new(FxHashMap::default()),
            next_address: 1,
        }
    }

    pub fn context(&self) -> &'ctx Context {
        self.ctx
    }

    /// Registers a struct layout. Declaring the same name again keeps the
    /// first layout.
    ///
    /// # Arguments
    ///
    /// * `name` - Struct name used in `Type::Struct`.
    /// * `fields` - Field types in declaration order.
    pub fn declare_struct(&mut self, name: &str, fields: Vec<Type>) {
        if !self.structs.contains_key(name) {
            Rc::make_mut(&mut self.structs).insert(name.to_string(), fields);
        }
    }

    pub fn struct_fields(&self, name: &str) -> SymbolicResult<&[Type]> {
        self.structs
            .get(name)
            .map(|f| f.as_slice())
            .ok_or_else(|| SymbolicError::UnknownStructure(name.to_string()))
    }

    /// Type of field `index` of struct `name`.
    ///
    /// # Returns
    ///
    /// The field type, `UnknownStructure` for an undeclared struct, or
    /// `UnknownField` when `index` is out of range.
    pub fn field_type(&self, name: &str, index: usize) -> SymbolicResult<Type> {
        self.struct_fields(name)?
            .get(index)
            .cloned()
            .ok_or_else(|| SymbolicError::UnknownField {
                structure: name.to_string(),
                index,
            })
    }

    pub fn line_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.lines.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn line(&self, tag: &str) -> Option<&MemoryLine<'ctx>> {
        self.lines.get(tag)
    }

    fn line_mut(&mut self, key: &str, range: &Sort<'ctx>) -> &mut MemoryLine<'ctx> {
        let ctx = self.ctx;
        Rc::make_mut(&mut self.lines)
            .entry(key.to_string())
            .or_insert_with(|| {
                let initial = Array::new_const(ctx, key, &Sort::int(ctx), range);
                MemoryLine {
                    current: initial.clone(),
                    initial,
                }
            })
    }

    fn select(&mut self, key: &str, ty: &Type, address: &Address<'ctx>) -> SymbolicResult<SymbolicValue<'ctx>> {
        let ctx = self.ctx;
        let index = address.to_int(ctx);
        let line = self.line_mut(key, &sort_of(ctx, ty));
        SymbolicValue::from_dynamic(&line.current.select(&index), ty)
    }

    fn update(
        &mut self,
        key: &str,
        ty: &Type,
        address: &Address<'ctx>,
        value: &SymbolicValue<'ctx>,
    ) -> SymbolicResult<()> {
        let ctx = self.ctx;
        let encoded = value.to_dynamic(ctx, ty)?;
        let index = address.to_int(ctx);
        let line = self.line_mut(key, &sort_of(ctx, ty));
        line.current = line.current.store(&index, &encoded);
        Ok(())
    }

    fn fresh_address(&mut self) -> i64 {
        let address = self.next_address;
        self.next_address += 1;
        address
    }

    /// Allocates a fresh object of type `ty` and returns a pointer to it.
    ///
    /// Struct and array fields held by value get storage of their own, so
    /// two objects never share a nested object. Arrays made here are empty.
    ///
    /// # Arguments
    ///
    /// * `ty` - Type of the object to allocate.
    ///
    /// # Returns
    ///
    /// A pointer whose address comes from a counter owned by this memory,
    /// so addresses are distinct within a run and identical across reruns.
    pub fn new_pointer(&mut self, ty: &Type) -> SymbolicResult<Pointer<'ctx>> {
        self.allocate(ty, None, &mut Vec::new(), &mut Vec::new())
    }

    /// `input_len` is `Some(max)` for input objects, whose arrays get a
    /// symbolic length in `0..=max`; assumptions bounding those lengths are
    /// appended to `assumptions`.
    fn allocate(
        &mut self,
        ty: &Type,
        input_len: Option<usize>,
        enclosing: &mut Vec<String>,
        assumptions: &mut Vec<Bool<'ctx>>,
    ) -> SymbolicResult<Pointer<'ctx>> {
        match ty {
            Type::Struct { name } => {
                self.struct_fields(name)?;
                let address = self.fresh_address();
                self.embed_fields(name, address, input_len, enclosing, assumptions)?;
                Ok(Pointer::new(Address::Concrete(address), ty.clone()))
            }
            Type::Array { elem } => {
                let address = self.fresh_address();
                self.init_array(elem, address, input_len, enclosing, assumptions)?;
                Ok(Pointer::new(Address::Concrete(address), ty.clone()))
            }
            _ => Ok(Pointer::new(
                Address::Concrete(self.fresh_address()),
                ty.clone(),
            )),
        }
    }

    fn embed_fields(
        &mut self,
        name: &str,
        address: i64,
        input_len: Option<usize>,
        enclosing: &mut Vec<String>,
        assumptions: &mut Vec<Bool<'ctx>>,
    ) -> SymbolicResult<()> {
        if enclosing.iter().any(|n| n == name) {
            return Err(SymbolicError::UnsupportedConstruct(format!(
                "struct `{}` contains itself",
                name
            )));
        }
        let fields = self.struct_fields(name)?.to_vec();
        enclosing.push(name.to_string());
        for (index, field_ty) in fields.iter().enumerate() {
            if matches!(field_ty, Type::Struct { .. } | Type::Array { .. }) {
                let nested = self.allocate(field_ty, input_len, enclosing, assumptions)?;
                self.update(
                    &field_key(name, index),
                    field_ty,
                    &Address::Concrete(address),
                    &SymbolicValue::Pointer(nested),
                )?;
            }
        }
        enclosing.pop();
        Ok(())
    }

    /// Writes an array header at `address`: empty for allocations, of
    /// bounded symbolic length for inputs.
    fn init_array(
        &mut self,
        elem: &Type,
        address: i64,
        input_len: Option<usize>,
        enclosing: &mut Vec<String>,
        assumptions: &mut Vec<Bool<'ctx>>,
    ) -> SymbolicResult<()> {
        let ctx = self.ctx;
        let (length, slots) = match input_len {
            Some(max_len) => {
                let length = BV::fresh_const(ctx, "len", ARRAY_LENGTH_WIDTH);
                assumptions.extend(length_bounds(ctx, &length, max_len));
                (SymbolicValue::SymbolicInt(length, ARRAY_LENGTH_WIDTH), max_len)
            }
            None => (SymbolicValue::int(0, ARRAY_LENGTH_WIDTH), 0),
        };
        self.build_array(elem, address, &length, slots, input_len, enclosing, assumptions)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_array(
        &mut self,
        elem: &Type,
        wrapper: i64,
        length: &SymbolicValue<'ctx>,
        slots: usize,
        input_len: Option<usize>,
        enclosing: &mut Vec<String>,
        assumptions: &mut Vec<Bool<'ctx>>,
    ) -> SymbolicResult<()> {
        let wrapper = Address::Concrete(wrapper);
        let data = Address::Concrete(self.fresh_address());
        self.update(
            &array_data_key(elem),
            &Type::pointer(elem.clone()),
            &wrapper,
            &SymbolicValue::Pointer(Pointer::new(data.clone(), elem.clone())),
        )?;
        self.update(&array_len_key(elem), &Type::int(ARRAY_LENGTH_WIDTH), &wrapper, length)?;

        for address in self.assign_slots(elem, &data, slots)? {
            match elem {
                // recursion through an array: the inner copies start empty
                Type::Struct { name } if enclosing.iter().any(|n| n == name) => {
                    self.embed_fields(name, address, None, &mut Vec::new(), assumptions)?
                }
                Type::Struct { name } => {
                    self.embed_fields(name, address, input_len, enclosing, assumptions)?
                }
                Type::Array { elem: inner } => {
                    self.init_array(inner, address, input_len, enclosing, assumptions)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Writes through a pointer.
    ///
    /// Writing a struct or an array through a reference to one copies its
    /// fields (or its header) into the target. A by-value field receives the
    /// copy in its own nested object.
    ///
    /// # Arguments
    ///
    /// * `ptr` - Target reference.
    /// * `value` - Value to write; a reference when the target is a struct
    ///   or an array.
    pub fn store(&mut self, ptr: &Pointer<'ctx>, value: &SymbolicValue<'ctx>) -> SymbolicResult<()> {
        if let Some(field) = &ptr.field {
            let ty = self.field_type(&field.structure, field.index)?;
            if matches!(ty, Type::Struct { .. } | Type::Array { .. }) {
                // by-value fields keep their own object and receive a copy
                let nested = self.load(ptr)?.as_pointer()?.clone();
                return self.store(&nested, value);
            }
            return self.update(&field_key(&field.structure, field.index), &ty, &ptr.address, value);
        }
        match &ptr.pointee {
            Type::Struct { name } => {
                let source = value.as_pointer()?.clone();
                let count = self.struct_fields(name)?.len();
                for index in 0..count {
                    let field_value = self.load_field(&source, index)?;
                    self.store_field(ptr, index, &field_value)?;
                }
                Ok(())
            }
            Type::Array { elem } => {
                let source = value.as_pointer()?.clone();
                let (_, source_address) = self.array_object(&source)?;
                let data_type = Type::pointer((**elem).clone());
                let data = self.select(&array_data_key(elem), &data_type, &source_address)?;
                let length = self.select(&array_len_key(elem), &Type::int(ARRAY_LENGTH_WIDTH), &source_address)?;
                self.update(&array_data_key(elem), &data_type, &ptr.address, &data)?;
                self.update(&array_len_key(elem), &Type::int(ARRAY_LENGTH_WIDTH), &ptr.address, &length)
            }
            pointee => {
                let pointee = pointee.clone();
                self.update(&cell_key(&pointee), &pointee, &ptr.address, value)
            }
        }
    }

    /// Reads through a pointer. A read that precedes every write yields the
    /// unconstrained initial content of the line.
    ///
    /// # Returns
    ///
    /// The stored value. A struct or array reference reads as itself, a
    /// by-value field as a reference to its nested object.
    pub fn load(&mut self, ptr: &Pointer<'ctx>) -> SymbolicResult<SymbolicValue<'ctx>> {
        if let Some(field) = &ptr.field {
            let ty = self.field_type(&field.structure, field.index)?;
            return self.select(&field_key(&field.structure, field.index), &ty, &ptr.address);
        }
        match &ptr.pointee {
            Type::Struct { .. } | Type::Array { .. } => Ok(SymbolicValue::Pointer(ptr.clone())),
            pointee => {
                let pointee = pointee.clone();
                self.select(&cell_key(&pointee), &pointee, &ptr.address)
            }
        }
    }

    /// Resolves a reference to a struct object, reading through a field
    /// slot when the reference points at a struct-typed field.
    fn struct_object(&mut self, ptr: &Pointer<'ctx>) -> SymbolicResult<(String, Address<'ctx>)> {
        let name = match &ptr.pointee {
            Type::Struct { name } => name.clone(),
            other => {
                return Err(SymbolicError::type_mismatch(
                    "field access",
                    &other.tag(),
                    "struct",
                ))
            }
        };
        if ptr.field.is_some() {
            let object = self.load(ptr)?;
            Ok((name, object.as_pointer()?.address.clone()))
        } else {
            Ok((name, ptr.address.clone()))
        }
    }

    fn array_object(&mut self, ptr: &Pointer<'ctx>) -> SymbolicResult<(Type, Address<'ctx>)> {
        let elem = match &ptr.pointee {
            Type::Array { elem } => (**elem).clone(),
            other => {
                return Err(SymbolicError::type_mismatch(
                    "array access",
                    &other.tag(),
                    "array",
                ))
            }
        };
        if ptr.field.is_some() {
            let object = self.load(ptr)?;
            Ok((elem, object.as_pointer()?.address.clone()))
        } else {
            Ok((elem, ptr.address.clone()))
        }
    }

    /// Pointer to field `index` of the struct `base` refers to.
    ///
    /// # Arguments
    ///
    /// * `base` - A struct object, or a field slot holding one.
    /// * `index` - Field position in the struct layout.
    ///
    /// # Returns
    ///
    /// A pointer into the field's own memory line, or `TypeMismatch` when
    /// `base` does not refer to a struct.
    pub fn field_pointer(&mut self, base: &Pointer<'ctx>, index: usize) -> SymbolicResult<Pointer<'ctx>> {
        let (name, address) = self.struct_object(base)?;
        let pointee = self.field_type(&name, index)?;
        Ok(Pointer {
            address,
            pointee,
            field: Some(FieldRef {
                structure: name,
                index,
            }),
        })
    }

    pub fn store_field(
        &mut self,
        base: &Pointer<'ctx>,
        index: usize,
        value: &SymbolicValue<'ctx>,
    ) -> SymbolicResult<()> {
        let field = self.field_pointer(base, index)?;
        self.store(&field, value)
    }

    pub fn load_field(&mut self, base: &Pointer<'ctx>, index: usize) -> SymbolicResult<SymbolicValue<'ctx>> {
        let field = self.field_pointer(base, index)?;
        self.load(&field)
    }

    /// Assigns distinct concrete element addresses to the first `slots`
    /// positions of the data block at `data` and returns them.
    fn assign_slots(&mut self, elem: &Type, data: &Address<'ctx>, slots: usize) -> SymbolicResult<Vec<i64>> {
        let ctx = self.ctx;
        let addresses: Vec<i64> = (0..slots).map(|_| self.fresh_address()).collect();
        let data_index = data.to_int(ctx);
        let range = Sort::array(ctx, &Sort::int(ctx), &Sort::int(ctx));
        let line = self.line_mut(&array_slots_key(elem), &range);
        let mut block = line
            .current
            .select(&data_index)
            .as_array()
            .ok_or_else(|| SymbolicError::UnsupportedConstruct("malformed array line".to_string()))?;
        for (k, address) in addresses.iter().enumerate() {
            block = block.store(&Int::from_i64(ctx, k as i64), &Int::from_i64(ctx, *address));
        }
        line.current = line.current.store(&data_index, &block);
        Ok(addresses)
    }

    /// Creates an array of `length` elements of type `elem`.
    ///
    /// # Arguments
    ///
    /// * `elem` - Element type.
    /// * `length` - Requested length, converted to a 64-bit integer.
    /// * `max_len` - Number of element slots backing a symbolic length;
    ///   the caller is expected to bound the length by it.
    ///
    /// # Returns
    ///
    /// A reference to the array object, or `UnsupportedConstruct` for a
    /// negative concrete length.
    pub fn new_array(
        &mut self,
        elem: &Type,
        length: &SymbolicValue<'ctx>,
        max_len: usize,
    ) -> SymbolicResult<Pointer<'ctx>> {
        let length = length.as_int(self.ctx, ARRAY_LENGTH_WIDTH)?;
        let slots = match length.as_concrete_int() {
            Some(n) if n < 0 => {
                return Err(SymbolicError::UnsupportedConstruct(format!(
                    "array of negative length {}",
                    n
                )))
            }
            Some(n) => n as usize,
            None => max_len,
        };

        let wrapper = self.fresh_address();
        self.build_array(elem, wrapper, &length, slots, None, &mut Vec::new(), &mut Vec::new())?;
        Ok(Pointer::new(Address::Concrete(wrapper), Type::array(elem.clone())))
    }

    /// Current length of `array` as a 64-bit integer.
    pub fn length(&mut self, array: &Pointer<'ctx>) -> SymbolicResult<SymbolicValue<'ctx>> {
        let (elem, address) = self.array_object(array)?;
        self.select(&array_len_key(&elem), &Type::int(ARRAY_LENGTH_WIDTH), &address)
    }

    /// Pointer to element `index` of `array`. Bounds are the caller's concern.
    ///
    /// # Arguments
    ///
    /// * `array` - An array object, or a field slot holding one.
    /// * `index` - Element position; symbolic positions select among the
    ///   concrete element addresses of the array's slots.
    pub fn element_pointer(
        &mut self,
        array: &Pointer<'ctx>,
        index: &SymbolicValue<'ctx>,
    ) -> SymbolicResult<Pointer<'ctx>> {
        let ctx = self.ctx;
        let (elem, address) = self.array_object(array)?;
        let data = self.select(&array_data_key(&elem), &Type::pointer(elem.clone()), &address)?;
        let data_index = data.as_pointer()?.address.to_int(ctx);
        let index = index_term(ctx, index)?;

        let range = Sort::array(ctx, &Sort::int(ctx), &Sort::int(ctx));
        let line = self.line_mut(&array_slots_key(&elem), &range);
        let slot = line
            .current
            .select(&data_index)
            .as_array()
            .and_then(|block| block.select(&index).as_int())
            .ok_or_else(|| SymbolicError::UnsupportedConstruct("malformed array line".to_string()))?;
        Ok(Pointer::new(Address::from_int(slot), elem))
    }

    /// Binds a parameter of type `ty` to an input object.
    ///
    /// Scalars become solver constants named after the parameter. Pointers,
    /// structs and arrays become distinct non-nil objects whose contents are
    /// the unconstrained initial memory, with their by-value fields
    /// allocated as for [`SymbolicMemory::new_pointer`].
    ///
    /// # Arguments
    ///
    /// * `name` - Parameter name.
    /// * `ty` - Declared parameter type.
    /// * `max_array_len` - Upper bound for the symbolic length of every
    ///   array reachable by value from the input.
    ///
    /// # Returns
    ///
    /// The bound value and the assumptions bounding array lengths, for the
    /// caller to add to the path condition.
    pub fn new_input(
        &mut self,
        name: &str,
        ty: &Type,
        max_array_len: usize,
    ) -> SymbolicResult<(SymbolicValue<'ctx>, Vec<Bool<'ctx>>)> {
        let mut assumptions = Vec::new();
        let ptr = match ty {
            Type::Int { .. } | Type::Float { .. } | Type::Bool => {
                return Ok((SymbolicValue::fresh(self.ctx, name, ty)?, assumptions))
            }
            Type::Pointer { elem } => {
                self.allocate(elem, Some(max_array_len), &mut Vec::new(), &mut assumptions)?
            }
            Type::Struct { .. } | Type::Array { .. } => {
                self.allocate(ty, Some(max_array_len), &mut Vec::new(), &mut assumptions)?
            }
        };
        Ok((SymbolicValue::Pointer(ptr), assumptions))
    }

    pub fn lookup_fmt(&self) -> String {
        let mut s = format!("{}\n", "🧠 SymbolicMemory [".cyan());
        s += &format!(
            "  {} {}\n",
            "next_address:".cyan(),
            self.next_address.to_string().bright_yellow()
        );
        for tag in self.line_tags() {
            s += &format!("  • {}\n", tag);
        }
        s += &format!("{}\n", "]".cyan());
        s
    }
}
