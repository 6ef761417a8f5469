//! Versioned field schemas of the downstream component types.
//!
//! Each [`FacadeSchema`] lists the fields a downstream component accepts as
//! ordered `(name, kind, default)` tuples. Schemas are looked up by adapter
//! name (as configured per process) or by facade type.

use tabula_types::{Row, Value};

/// Value shape a schema field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Text.
    Str,
    /// Number, or a per-period list of numbers.
    Float,
    /// Integer.
    Int,
    /// Flag.
    Bool,
    /// Bus role resolved from the process structure.
    Bus,
    /// Number, list, or reference to a sequence column.
    Sequence,
    /// Time-dependent profile. Like `Sequence`, but a process with a single
    /// timeseries column may use that column without a matching name.
    Profile,
    /// Nested parameter set.
    Dict,
}

impl FieldKind {
    /// True for fields that may reference a timeseries column.
    #[must_use]
    pub const fn is_sequence_like(self) -> bool {
        matches!(self, Self::Sequence | Self::Profile)
    }

    /// True for fields that accept the only timeseries column of a process.
    #[must_use]
    pub const fn accepts_single_column(self) -> bool {
        matches!(self, Self::Profile)
    }
}

/// Default of a schema field, applied by [`FacadeSchema::materialize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    /// No default; the field stays absent.
    None,
    /// Numeric default.
    Float(f64),
    /// Integer default.
    Int(i64),
    /// Flag default.
    Bool(bool),
    /// Text default.
    Str(&'static str),
}

impl FieldDefault {
    /// The default as a cell value, if any.
    #[must_use]
    pub fn to_value(self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Float(f) => Some(Value::Float(f)),
            Self::Int(i) => Some(Value::Int(i)),
            Self::Bool(b) => Some(Value::Bool(b)),
            Self::Str(s) => Some(Value::Str(s.to_string())),
        }
    }
}

/// One field of a facade schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Logical field name.
    pub name: &'static str,
    /// Accepted value shape.
    pub kind: FieldKind,
    /// Default applied on materialisation.
    pub default: FieldDefault,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        default: FieldDefault::None,
    }
}

const fn field_or(name: &'static str, kind: FieldKind, default: FieldDefault) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        default,
    }
}

/// Field contract of one downstream component type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacadeSchema {
    /// Facade type, e.g. `volatile`. Also the element table name.
    pub facade: &'static str,
    /// Adapter name used in the process-adapter map, e.g. `VolatileAdapter`.
    pub adapter: &'static str,
    /// Schema revision.
    pub version: u32,
    /// Ordered fields.
    pub fields: &'static [FieldSpec],
}

impl FacadeSchema {
    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of the bus-role fields, in schema order.
    pub fn bus_roles(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Bus)
            .map(|f| f.name)
    }

    /// Fields that may reference a sequence column.
    pub fn sequence_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.kind.is_sequence_like())
            .map(|f| f.name)
    }

    /// Fill schema defaults into a built field map.
    ///
    /// Fields present in `row` are kept as-is; absent or missing fields with a
    /// default receive it. Fields outside the schema are preserved after the
    /// schema fields.
    #[must_use]
    pub fn materialize(&self, row: &Row) -> Row {
        let mut out = Row::with_capacity(row.len().max(self.fields.len()));
        for spec in self.fields {
            match row.get(spec.name) {
                Some(v) if !v.is_missing() => {
                    out.insert(spec.name.to_string(), v.clone());
                }
                _ => {
                    if let Some(v) = spec.default.to_value() {
                        out.insert(spec.name.to_string(), v);
                    }
                }
            }
        }
        for (k, v) in row {
            if !out.contains_key(k) {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }
}

use FieldKind::{Bool, Bus, Dict, Float, Int, Profile, Sequence, Str};

/// Identity fields shared by every schema, followed by the given fields.
macro_rules! fields {
    ($($f:expr),* $(,)?) => {
        &[
            field("name", Str),
            field("type", Str),
            field("region", Str),
            field("carrier", Str),
            field("tech", Str),
            $($f),*
        ]
    };
}

macro_rules! schema {
    ($ident:ident, $facade:literal, $adapter:literal, [$($f:expr),* $(,)?]) => {
        #[doc = concat!("Schema of the `", $facade, "` component type.")]
        pub static $ident: FacadeSchema = FacadeSchema {
            facade: $facade,
            adapter: $adapter,
            version: 1,
            fields: fields![$($f),*],
        };
    };
}

const EXPANDABLE: FieldSpec = field_or("expandable", Bool, FieldDefault::Bool(false));
const MARGINAL_COST: FieldSpec = field_or("marginal_cost", Float, FieldDefault::Float(0.0));

schema!(VOLATILE, "volatile", "VolatileAdapter", [
    field("bus", Bus),
    field("capacity", Float),
    field("profile", Profile),
    field("capacity_cost", Float),
    field("capacity_potential", Float),
    field("capacity_minimum", Float),
    EXPANDABLE,
    MARGINAL_COST,
    field("max", Sequence),
    field("lifetime", Int),
    field("age", Int),
    field("output_parameters", Dict),
]);

schema!(DISPATCHABLE, "dispatchable", "DispatchableAdapter", [
    field("bus", Bus),
    field("capacity", Float),
    field_or("profile", Profile, FieldDefault::Float(1.0)),
    field("capacity_cost", Float),
    field("capacity_potential", Float),
    field("capacity_minimum", Float),
    EXPANDABLE,
    MARGINAL_COST,
    field("carrier_cost", Float),
    field("max", Sequence),
    field("lifetime", Int),
    field("age", Int),
    field("output_parameters", Dict),
]);

schema!(CONVERSION, "conversion", "ConversionAdapter", [
    field("from_bus", Bus),
    field("to_bus", Bus),
    field("capacity", Float),
    field_or("efficiency", Sequence, FieldDefault::Float(1.0)),
    field("capacity_cost", Float),
    field("capacity_potential", Float),
    field("capacity_minimum", Float),
    EXPANDABLE,
    MARGINAL_COST,
    field("carrier_cost", Float),
    field("max", Sequence),
    field("lifetime", Int),
    field("age", Int),
    field("input_parameters", Dict),
    field("output_parameters", Dict),
]);

schema!(STORAGE, "storage", "StorageAdapter", [
    field("bus", Bus),
    field("storage_capacity", Float),
    field("capacity", Float),
    field_or("efficiency", Float, FieldDefault::Float(1.0)),
    field("invest_relation_output_capacity", Float),
    field("storage_capacity_cost", Float),
    field("storage_capacity_potential", Float),
    field("capacity_cost", Float),
    field("capacity_potential", Float),
    EXPANDABLE,
    MARGINAL_COST,
    field_or("loss_rate", Float, FieldDefault::Float(0.0)),
    field("max", Sequence),
    field("lifetime", Int),
    field("age", Int),
    field("input_parameters", Dict),
    field("output_parameters", Dict),
]);

schema!(LOAD, "load", "LoadAdapter", [
    field("bus", Bus),
    field("amount", Float),
    field("profile", Profile),
    field("marginal_utility", Float),
    field("input_parameters", Dict),
]);

schema!(COMMODITY, "commodity", "CommodityAdapter", [
    field("bus", Bus),
    field("amount", Float),
    MARGINAL_COST,
    field("output_parameters", Dict),
]);

schema!(EXCESS, "excess", "ExcessAdapter", [
    field("bus", Bus),
    field("capacity", Float),
    MARGINAL_COST,
    field("input_parameters", Dict),
]);

schema!(SHORTAGE, "shortage", "ShortageAdapter", [
    field("bus", Bus),
    field("capacity", Float),
    MARGINAL_COST,
    field("output_parameters", Dict),
]);

schema!(LINK, "link", "LinkAdapter", [
    field("from_bus", Bus),
    field("to_bus", Bus),
    field("capacity", Float),
    field_or("loss", Float, FieldDefault::Float(0.0)),
    field("capacity_cost", Float),
    field("capacity_potential", Float),
    EXPANDABLE,
    MARGINAL_COST,
    field_or("limit_direction", Bool, FieldDefault::Bool(false)),
    field("max", Sequence),
    field("lifetime", Int),
]);

schema!(EXTRACTION_TURBINE, "extraction_turbine", "ExtractionTurbineAdapter", [
    field("fuel_bus", Bus),
    field("electricity_bus", Bus),
    field("heat_bus", Bus),
    field("carrier_cost", Float),
    field("capacity", Float),
    field("condensing_efficiency", Sequence),
    field("electric_efficiency", Sequence),
    field("thermal_efficiency", Sequence),
    field("capacity_cost", Float),
    field("capacity_potential", Float),
    EXPANDABLE,
    MARGINAL_COST,
    field("max", Sequence),
    field("lifetime", Int),
    field("age", Int),
    field("input_parameters", Dict),
]);

schema!(BACKPRESSURE_TURBINE, "backpressure_turbine", "BackpressureTurbineAdapter", [
    field("fuel_bus", Bus),
    field("electricity_bus", Bus),
    field("heat_bus", Bus),
    field("carrier_cost", Float),
    field("capacity", Float),
    field("electric_efficiency", Sequence),
    field("thermal_efficiency", Sequence),
    field("capacity_cost", Float),
    field("capacity_potential", Float),
    EXPANDABLE,
    MARGINAL_COST,
    field("max", Sequence),
    field("lifetime", Int),
    field("age", Int),
    field("input_parameters", Dict),
]);

schema!(HEAT_PUMP, "heat_pump", "HeatPumpAdapter", [
    field("electricity_bus", Bus),
    field("high_temperature_bus", Bus),
    field("low_temperature_bus", Bus),
    field("capacity", Float),
    field("cop", Sequence),
    field("capacity_cost", Float),
    field("capacity_potential", Float),
    EXPANDABLE,
    MARGINAL_COST,
    field("carrier_cost", Float),
    field("max", Sequence),
    field("lifetime", Int),
    field("age", Int),
    field("input_parameters", Dict),
]);

static ALL: [&FacadeSchema; 12] = [
    &VOLATILE,
    &DISPATCHABLE,
    &CONVERSION,
    &STORAGE,
    &LOAD,
    &COMMODITY,
    &EXCESS,
    &SHORTAGE,
    &LINK,
    &EXTRACTION_TURBINE,
    &BACKPRESSURE_TURBINE,
    &HEAT_PUMP,
];

/// Every known schema.
#[must_use]
pub fn all() -> &'static [&'static FacadeSchema] {
    &ALL
}

/// Schema registered under an adapter name.
#[must_use]
pub fn by_adapter(adapter: &str) -> Option<&'static FacadeSchema> {
    ALL.iter().copied().find(|s| s.adapter == adapter)
}

/// Schema of a facade type.
#[must_use]
pub fn by_facade(facade: &str) -> Option<&'static FacadeSchema> {
    ALL.iter().copied().find(|s| s.facade == facade)
}
