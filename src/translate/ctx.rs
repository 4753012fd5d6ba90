//! Translation context threaded through the recursion.
//!
//! All per-call state — the growing parameter bag, the next free parameter
//! index, the ambient `cypherParams` — lives here and is passed explicitly
//! down every recursive call. There are no module-level counters, which is
//! what makes the translator reentrant under concurrent resolvers.

use serde_json::Value;

use crate::schema::SchemaCatalog;
use crate::utils::naming;
use crate::values::ParameterBag;

/// Reserved parameter key for ambient values supplied by the request context
/// (authenticated user id and the like).
pub const CYPHER_PARAMS_KEY: &str = "cypherParams";

#[derive(Debug)]
pub struct TranslationContext<'a> {
    pub catalog: &'a SchemaCatalog,
    bag: ParameterBag,
    /// Next free index for nested argument parameters (`1_filter`,
    /// `2_orderBy`, ...). Root-field arguments are unprefixed (index 0).
    next_index: usize,
    cypher_params: Option<Value>,
}

impl<'a> TranslationContext<'a> {
    pub fn new(catalog: &'a SchemaCatalog, cypher_params: Option<Value>) -> Self {
        TranslationContext {
            catalog,
            bag: ParameterBag::new(),
            next_index: 1,
            cypher_params,
        }
    }

    /// Claim a parameter index for one nested field's arguments. All
    /// arguments of that field share the index; traversal order fixes it
    /// deterministically.
    pub fn claim_param_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Serialize one argument under the indexed name and return the name.
    pub fn add_param(&mut self, index: usize, arg_name: &str, value: Value) -> String {
        let name = naming::param_name(index, arg_name);
        self.bag.insert(name.clone(), value);
        name
    }

    pub fn add_named_param(&mut self, name: impl Into<String>, value: Value) {
        self.bag.insert(name, value);
    }

    /// Serialize the ambient `cypherParams` value (once) and return the
    /// parameter reference to embed in apoc argument maps.
    pub fn bind_cypher_params(&mut self) -> String {
        if !self.bag.contains(CYPHER_PARAMS_KEY) {
            let value = self.cypher_params.clone().unwrap_or(Value::Null);
            self.bag.insert(CYPHER_PARAMS_KEY, value);
        }
        format!("${}", CYPHER_PARAMS_KEY)
    }

    pub fn bag(&self) -> &ParameterBag {
        &self.bag
    }

    pub fn into_bag(self) -> ParameterBag {
        self.bag
    }
}
