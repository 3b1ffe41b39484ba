//! Expression translator
//!
//! Turns IR expressions into NetLogo reporter text. Translation is a pure
//! function of the expression, the procedure's owner and the agents bound by
//! enclosing `ask`/`with` blocks, so translating the same expression twice
//! always gives the same text.

use xnlogo_core::ast::{BinaryOperator, BoolOperator, CompareOperator, UnaryOperator};
use xnlogo_core::ir::{
    kebab_case, AgentSpec, Expression, Literal, ModelSpec, Number, SubscriptIndex,
};

/// Agent a block binds: the procedure's own agent, a loop variable, or an
/// agentset member with no name in the source
#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    Owner,
    Variable(String),
    Anonymous,
}

/// Role of a binding seen from the innermost block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Current,
    Asker,
}

/// Agents bound by enclosing `ask`/`with` blocks, innermost last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentContext {
    bindings: Vec<Binding>,
}

impl Default for AgentContext {
    fn default() -> Self {
        Self {
            bindings: vec![Binding::Owner],
        }
    }
}

impl AgentContext {
    /// Context one block deeper, binding `variable` to the asked agent
    pub fn enter(&self, variable: &str) -> Self {
        self.push(Binding::Variable(variable.to_string()))
    }

    /// Context inside `ask <expr> [ ... ]` where the agent has no name
    pub fn enter_anonymous(&self) -> Self {
        self.push(Binding::Anonymous)
    }

    /// Context inside `ask myself [ ... ]`: the two innermost agents trade places
    pub fn swapped(&self) -> Self {
        let mut bindings = self.bindings.clone();
        let n = bindings.len();
        if n >= 2 {
            bindings.swap(n - 1, n - 2);
        } else {
            bindings.insert(0, Binding::Anonymous);
        }
        Self { bindings }
    }

    /// True inside at least one `ask` or `with` block
    pub fn is_nested(&self) -> bool {
        self.bindings.len() > 1
    }

    fn push(&self, binding: Binding) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.push(binding);
        Self { bindings }
    }

    fn role(&self, binding: &Binding) -> Option<Role> {
        let n = self.bindings.len();
        if self.bindings.last() == Some(binding) {
            Some(Role::Current)
        } else if n >= 2 && &self.bindings[n - 2] == binding {
            Some(Role::Asker)
        } else {
            None
        }
    }

    fn variable_role(&self, name: &str) -> Option<Role> {
        self.role(&Binding::Variable(name.to_string()))
    }

    /// The procedure's own agent is not reachable past the asker, so
    /// deeper references fall back to `myself`
    fn owner_role(&self) -> Role {
        self.role(&Binding::Owner).unwrap_or(Role::Asker)
    }
}

/// Position of a call in the generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPosition {
    Command,
    Reporter,
}

/// What an attribute or call is applied to
enum Receiver<'e> {
    /// The agent running the current code
    Current,
    /// The agent that issued the enclosing `ask`
    Asker,
    /// Observer-level state reached through `self.model`
    Model,
    /// A module such as `math` or `random`
    Module(&'e str),
    Other(&'e Expression),
}

/// Method names with a NetLogo spelling other than their kebab-case form
const PRIMITIVE_ALIASES: &[(&str, &str)] = &[
    ("distance_to", "distance"),
    ("patch", "patch-here"),
    ("fd", "forward"),
    ("bk", "back"),
    ("lt", "left"),
    ("rt", "right"),
];

/// Expression translator for one procedure owner
#[derive(Debug, Clone, Copy)]
pub struct ExpressionTranslator<'m> {
    model: &'m ModelSpec,
    owner: Option<&'m AgentSpec>,
}

impl<'m> ExpressionTranslator<'m> {
    /// `owner` is `None` for model-level procedures
    pub fn new(model: &'m ModelSpec, owner: Option<&'m AgentSpec>) -> Self {
        Self { model, owner }
    }

    /// Reporter text for an expression
    pub fn translate(&self, expr: &Expression, ctx: &AgentContext) -> String {
        match expr {
            Expression::Literal(literal) => self.literal(literal, ctx),

            Expression::Name(name) => match ctx.variable_role(name) {
                Some(Role::Current) => "self".to_string(),
                Some(Role::Asker) => "myself".to_string(),
                None => name.clone(),
            },

            Expression::SelfRef => match ctx.owner_role() {
                Role::Current => "self".to_string(),
                Role::Asker => "myself".to_string(),
            },

            Expression::Attribute { base, attr } => self.attribute(base, attr, ctx),

            Expression::BinaryOp { op, left, right } => self.binary(*op, left, right, ctx),

            Expression::UnaryOp { op, operand } => match op {
                UnaryOperator::Not => format!("not {}", self.operand(operand, ctx)),
                UnaryOperator::Neg => match operand.as_ref() {
                    Expression::Literal(Literal::Number(number)) => {
                        format!("-{}", format_number(*number))
                    }
                    _ => format!("(- {})", self.operand(operand, ctx)),
                },
                UnaryOperator::Pos => self.translate(operand, ctx),
                UnaryOperator::Invert => format!("(-1 - {})", self.operand(operand, ctx)),
            },

            Expression::Compare { op, left, right } => {
                let left = self.operand(left, ctx);
                let right = self.operand(right, ctx);
                match op {
                    CompareOperator::In => format!("(member? {} {})", left, right),
                    CompareOperator::NotIn => format!("(not member? {} {})", left, right),
                    other => format!("({} {} {})", left, compare_symbol(*other), right),
                }
            }

            Expression::BoolOp { op, operands } => {
                let joiner = match op {
                    BoolOperator::And => " and ",
                    BoolOperator::Or => " or ",
                };
                let parts: Vec<String> = operands.iter().map(|e| self.operand(e, ctx)).collect();
                format!("({})", parts.join(joiner))
            }

            Expression::Call {
                callee,
                args,
                keywords,
            } => {
                let argv: Vec<&Expression> =
                    args.iter().chain(keywords.iter().map(|(_, e)| e)).collect();
                self.call(callee, &argv, ctx, CallPosition::Reporter)
            }

            Expression::Subscript { base, index } => self.subscript(base, index, ctx),

            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => format!(
                "ifelse-value {} [ {} ] [ {} ]",
                self.operand(condition, ctx),
                self.translate(then, ctx),
                self.translate(otherwise, ctx)
            ),

            Expression::Filter {
                source,
                variable,
                condition,
            } => format!(
                "{} with [ {} ]",
                self.operand(source, ctx),
                self.translate(condition, &ctx.enter(variable))
            ),
        }
    }

    /// Reporter text, parenthesized when it is a compound prefix form
    pub fn operand(&self, expr: &Expression, ctx: &AgentContext) -> String {
        parenthesize(self.translate(expr, ctx))
    }

    /// Command text for a call in statement position
    pub fn command(&self, expr: &Expression, ctx: &AgentContext) -> String {
        match expr {
            Expression::Call {
                callee,
                args,
                keywords,
            } => {
                let argv: Vec<&Expression> =
                    args.iter().chain(keywords.iter().map(|(_, e)| e)).collect();
                self.call(callee, &argv, ctx, CallPosition::Command)
            }
            other => self.translate(other, ctx),
        }
    }

    fn literal(&self, literal: &Literal, ctx: &AgentContext) -> String {
        match literal {
            Literal::Number(number) => format_number(*number),
            Literal::Bool(true) => "true".to_string(),
            Literal::Bool(false) => "false".to_string(),
            Literal::Str(value) => quote(value),
            Literal::None => "nobody".to_string(),
            Literal::List(items) => {
                let parts: Vec<String> = items.iter().map(|e| self.operand(e, ctx)).collect();
                if items.iter().all(Expression::is_constant) {
                    format!("[{}]", parts.join(" "))
                } else {
                    format!("(list {})", parts.join(" "))
                }
            }
        }
    }

    fn receiver<'e>(&self, base: &'e Expression, ctx: &AgentContext) -> Receiver<'e> {
        match base {
            Expression::SelfRef => role_receiver(ctx.owner_role()),
            Expression::Name(name) if ctx.variable_role(name).is_some() => {
                ctx.variable_role(name).map_or(Receiver::Other(base), role_receiver)
            }
            Expression::Name(name) if name == "math" || name == "random" => {
                Receiver::Module(name.as_str())
            }
            Expression::Attribute { base, attr }
                if attr == "model" && matches!(base.as_ref(), Expression::SelfRef) =>
            {
                Receiver::Model
            }
            other => Receiver::Other(other),
        }
    }

    fn attribute(&self, base: &Expression, attr: &str, ctx: &AgentContext) -> String {
        match self.receiver(base, ctx) {
            Receiver::Current | Receiver::Model => attr.to_string(),
            Receiver::Asker => format!("[{}] of myself", attr),
            Receiver::Module("math") if attr == "pi" => "pi".to_string(),
            Receiver::Module("math") if attr == "e" => "e".to_string(),
            Receiver::Module(module) => format!("{}-{}", module, kebab_case(attr)),
            Receiver::Other(other) => format!("[{}] of {}", attr, self.operand(other, ctx)),
        }
    }

    fn binary(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        ctx: &AgentContext,
    ) -> String {
        if op == BinaryOperator::Add && is_string_concat(left, right) {
            let mut parts = Vec::new();
            self.concat_parts(left, ctx, &mut parts);
            self.concat_parts(right, ctx, &mut parts);
            return format!("(word {})", parts.join(" "));
        }

        let l = self.operand(left, ctx);
        let r = self.operand(right, ctx);
        match op {
            BinaryOperator::FloorDiv => format!("floor ({} / {})", l, r),
            BinaryOperator::Mod => format!("({} mod {})", l, r),
            BinaryOperator::Pow => format!("({} ^ {})", l, r),
            other => format!("({} {} {})", l, other.symbol(), r),
        }
    }

    fn concat_parts(&self, expr: &Expression, ctx: &AgentContext, parts: &mut Vec<String>) {
        match expr {
            Expression::BinaryOp {
                op: BinaryOperator::Add,
                left,
                right,
            } if is_string_concat(left, right) => {
                self.concat_parts(left, ctx, parts);
                self.concat_parts(right, ctx, parts);
            }
            other => parts.push(self.operand(other, ctx)),
        }
    }

    fn subscript(&self, base: &Expression, index: &SubscriptIndex, ctx: &AgentContext) -> String {
        let list = self.operand(base, ctx);
        match index {
            SubscriptIndex::Index(index) => match negative_literal(index) {
                Some(1) => format!("last {}", list),
                Some(k) => format!("item ((length {}) - {}) {}", list, k, list),
                None => format!("item {} {}", self.operand(index, ctx), list),
            },
            SubscriptIndex::Slice { start, stop } => {
                let start = start
                    .as_ref()
                    .map_or_else(|| "0".to_string(), |e| self.operand(e, ctx));
                let stop = stop
                    .as_ref()
                    .map_or_else(|| format!("(length {})", list), |e| self.operand(e, ctx));
                format!("sublist {} {} {}", list, start, stop)
            }
        }
    }

    fn call(
        &self,
        callee: &Expression,
        args: &[&Expression],
        ctx: &AgentContext,
        position: CallPosition,
    ) -> String {
        let argv: Vec<String> = args.iter().map(|e| self.operand(e, ctx)).collect();

        match callee {
            Expression::Name(name) => self.builtin(name, args, &argv, ctx),
            Expression::Attribute { base, attr } => {
                let on_owner = matches!(base.as_ref(), Expression::SelfRef);
                match self.receiver(base, ctx) {
                    Receiver::Current => apply(&self.method_procedure(attr, on_owner), &argv),
                    Receiver::Model => apply(&kebab_case(attr), &argv),
                    Receiver::Asker => {
                        let call = apply(&self.method_procedure(attr, on_owner), &argv);
                        remote(&call, "myself", position)
                    }
                    Receiver::Module("math") => math_call(attr, &argv),
                    Receiver::Module(_) => random_call(attr, &argv),
                    Receiver::Other(other) => self.object_call(other, attr, &argv, ctx, position),
                }
            }
            other => apply(&self.operand(other, ctx), &argv),
        }
    }

    /// Procedure a method name resolves to. The owner's own behaviors come
    /// first, then any agent or model behavior of that name, then primitives.
    fn method_procedure(&self, method: &str, prefer_owner: bool) -> String {
        if prefer_owner {
            if let Some(owner) = self.owner {
                if owner.behavior(method).is_some() {
                    return owner.procedure_name(method);
                }
            }
            if self.owner.is_none() && self.is_model_procedure(method) {
                return kebab_case(method);
            }
        }
        if method == "set_heading" {
            return "set heading".to_string();
        }
        if let Some((_, primitive)) = PRIMITIVE_ALIASES.iter().find(|(name, _)| *name == method) {
            return primitive.to_string();
        }
        if let Some(agent) = self
            .model
            .agents
            .iter()
            .find(|agent| agent.behavior(method).is_some())
        {
            return agent.procedure_name(method);
        }
        kebab_case(method)
    }

    fn is_model_procedure(&self, name: &str) -> bool {
        self.model
            .behaviors
            .iter()
            .chain(self.model.reporters.iter())
            .any(|b| b.name == name)
    }

    /// Method call on a collection or another agent
    fn object_call(
        &self,
        base: &Expression,
        method: &str,
        argv: &[String],
        ctx: &AgentContext,
        position: CallPosition,
    ) -> String {
        let target = self.operand(base, ctx);
        match (method, argv) {
            ("count", []) => format!("count {}", target),
            ("one", []) => format!("one-of {}", target),
            ("any", []) => format!("any? {}", target),
            ("all", []) | ("copy", []) => self.translate(base, ctx),
            ("sample", [n]) => format!("n-of {} {}", n, target),
            ("create", [n]) => format!("create-{} {}", self.translate(base, ctx), n),
            ("in_radius", [r]) => format!("{} in-radius {}", target, r),
            ("in_cone", [d, a]) => format!("{} in-cone {} {}", target, d, a),
            ("append", [v]) => format!("lput {} {}", v, target),
            ("extend", [v]) => format!("sentence {} {}", target, v),
            ("index", [v]) => format!("position {} {}", v, target),
            ("remove", [v]) => format!("remove {} {}", v, target),
            ("insert", [i, v]) => format!("insert-item {} {} {}", i, target, v),
            _ => {
                let call = apply(&self.method_procedure(method, false), argv);
                remote(&call, &target, position)
            }
        }
    }

    fn builtin(
        &self,
        name: &str,
        args: &[&Expression],
        argv: &[String],
        ctx: &AgentContext,
    ) -> String {
        match (name, argv) {
            ("print", []) => "print \"\"".to_string(),
            ("print", [value]) => format!("print {}", value),
            ("print", values) => format!("print (word {})", values.join(" \" \" ")),
            ("len", [value]) => format!("length {}", value),
            ("abs", [value]) => format!("abs {}", value),
            ("round", [value]) => format!("round {}", value),
            ("round", [value, digits]) => format!("precision {} {}", value, digits),
            ("int", [value]) => format!("int {}", value),
            ("float", [_]) | ("list", [_]) => self.translate(args[0], ctx),
            ("list", []) => "[]".to_string(),
            ("str", [value]) => format!("(word {})", value),
            ("min", [value]) => format!("min {}", value),
            ("max", [value]) => format!("max {}", value),
            ("min", values) if values.len() > 1 => format!("min (list {})", values.join(" ")),
            ("max", values) if values.len() > 1 => format!("max (list {})", values.join(" ")),
            ("sum", [value]) => format!("sum {}", value),
            ("mean", [value]) => format!("mean {}", value),
            ("sorted", [value]) => format!("sort {}", value),
            ("reversed", [value]) => format!("reverse {}", value),
            ("range", [stop]) => format!("range {}", stop),
            ("range", values) => format!("(range {})", values.join(" ")),
            ("random", []) | ("random_float", []) => "random-float 1".to_string(),
            ("random", [n]) => format!("random {}", n),
            ("random_float", [n]) => format!("random-float {}", n),
            _ => apply(&kebab_case(name), argv),
        }
    }
}

fn role_receiver<'e>(role: Role) -> Receiver<'e> {
    match role {
        Role::Current => Receiver::Current,
        Role::Asker => Receiver::Asker,
    }
}

/// `name a b`, or `name` alone
fn apply(name: &str, argv: &[String]) -> String {
    if argv.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, argv.join(" "))
    }
}

/// Run a call in another agent's context
fn remote(call: &str, target: &str, position: CallPosition) -> String {
    match position {
        CallPosition::Command => format!("ask {} [ {} ]", target, call),
        CallPosition::Reporter => format!("[{}] of {}", call, target),
    }
}

fn math_call(function: &str, argv: &[String]) -> String {
    match (function, argv) {
        ("sqrt", [x]) => format!("sqrt {}", x),
        ("exp", [x]) => format!("exp {}", x),
        ("log", [x]) => format!("ln {}", x),
        ("log", [x, base]) => format!("log {} {}", x, base),
        ("log10", [x]) => format!("log {} 10", x),
        ("floor", [x]) => format!("floor {}", x),
        ("ceil", [x]) => format!("ceiling {}", x),
        ("fabs", [x]) => format!("abs {}", x),
        ("pow", [x, y]) => format!("({} ^ {})", x, y),
        // NetLogo trigonometry works in degrees
        ("sin", [x]) | ("cos", [x]) | ("tan", [x]) => {
            format!("{} ({} * 180 / pi)", function, x)
        }
        ("degrees", [x]) => format!("({} * 180 / pi)", x),
        ("radians", [x]) => format!("({} * pi / 180)", x),
        _ => apply(&kebab_case(function), argv),
    }
}

fn random_call(function: &str, argv: &[String]) -> String {
    match (function, argv) {
        ("random", []) => "random-float 1".to_string(),
        ("randint", [low, high]) if low == "0" => format!("random ({} + 1)", high),
        ("randint", [low, high]) => format!("({} + random ({} - {} + 1))", low, high, low),
        ("uniform", [low, high]) => format!("({} + random-float ({} - {}))", low, high, low),
        ("choice", [items]) => format!("one-of {}", items),
        ("sample", [items, k]) => format!("n-of {} {}", k, items),
        ("shuffle", [items]) => format!("shuffle {}", items),
        ("gauss", [mu, sigma]) | ("normalvariate", [mu, sigma]) => {
            format!("random-normal {} {}", mu, sigma)
        }
        ("seed", [n]) => format!("random-seed {}", n),
        _ => apply(&format!("random-{}", kebab_case(function)), argv),
    }
}

fn compare_symbol(op: CompareOperator) -> &'static str {
    match op {
        CompareOperator::Eq | CompareOperator::Is => "=",
        CompareOperator::NotEq | CompareOperator::IsNot => "!=",
        other => other.symbol(),
    }
}

fn is_string_concat(left: &Expression, right: &Expression) -> bool {
    fn stringy(expr: &Expression) -> bool {
        match expr {
            Expression::Literal(Literal::Str(_)) => true,
            Expression::BinaryOp {
                op: BinaryOperator::Add,
                left,
                right,
            } => is_string_concat(left, right),
            _ => false,
        }
    }
    stringy(left) || stringy(right)
}

/// `k` for a literal `-k` index
fn negative_literal(expr: &Expression) -> Option<i64> {
    match expr {
        Expression::UnaryOp {
            op: UnaryOperator::Neg,
            operand,
        } => match operand.as_ref() {
            Expression::Literal(Literal::Number(Number::Int(k))) if *k > 0 => Some(*k),
            _ => None,
        },
        Expression::Literal(Literal::Number(Number::Int(k))) if *k < 0 => Some(-k),
        _ => None,
    }
}

pub(crate) fn format_number(number: Number) -> String {
    match number {
        Number::Int(n) => n.to_string(),
        Number::Float(x) if x.is_finite() => format!("{:?}", x),
        Number::Float(x) if x.is_nan() => "0".to_string(),
        Number::Float(x) if x > 0.0 => "1.0E308".to_string(),
        Number::Float(_) => "-1.0E308".to_string(),
    }
}

/// NetLogo string literal
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Wrap text that has a space outside brackets and strings
fn parenthesize(text: String) -> String {
    if has_top_level_space(&text) {
        format!("({})", text)
    } else {
        text
    }
}

fn has_top_level_space(text: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ' ' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}
