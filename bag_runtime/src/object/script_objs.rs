//! Script-surface kinds: variable declarations and runnable expressions.

use bag_script::{Expression, ScriptError, ScriptStream, Variable};

use crate::effect::Effect;

use super::{BagObject, ParseCtx};

/// `VAR name [AS GLOBAL|TIMER|RANDOM|CONSTANT] [= value]`. The variable is
/// declared into the store at parse time; running the object re-asserts
/// its parsed value (the SET VAR idiom).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableDeclObject {
    pub value: String,
}

impl VariableDeclObject {
    pub fn parse(
        &mut self,
        object: &mut BagObject,
        stream: &mut ScriptStream<'_>,
        ctx: &mut ParseCtx<'_>,
    ) -> Result<(), ScriptError> {
        let name = stream.read_token();
        object.set_name(name.clone());
        let (mut global, mut timer, mut random, mut constant) = (false, false, false, false);
        loop {
            stream.eat_white();
            if stream.peek() == Some('=') {
                stream.get();
                self.value = stream.read_quoted_or_word();
                continue;
            }
            let token = stream.read_token();
            if token.is_empty() {
                break;
            }
            match token.as_str() {
                "AS" => match stream.read_token().as_str() {
                    "GLOBAL" => global = true,
                    "TIMER" => timer = true,
                    "RANDOM" => random = true,
                    "CONSTANT" => constant = true,
                    _ => {}
                },
                _ => {
                    stream.push_back(token);
                    break;
                }
            }
        }
        let mut var = Variable::new(name, self.value.clone());
        if global {
            var = var.global();
        }
        if timer {
            var = var.timer();
        }
        if random {
            var = var.random();
        }
        if constant {
            var = var.constant();
        }
        ctx.vars.add(var);
        object.set_visible(false);
        Ok(())
    }

    pub fn run(&mut self, object: &BagObject) -> Vec<Effect> {
        vec![Effect::SetVariable {
            name: object.name().to_string(),
            value: self.value.clone(),
        }]
    }
}

/// `EXPR [name] = (expression)`. The expression lives in the owning
/// device's arena; running the object executes it with assignment writes
/// enabled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpressionObject {
    pub expr: Option<bag_script::ExprId>,
}

impl ExpressionObject {
    pub fn parse(
        &mut self,
        object: &mut BagObject,
        stream: &mut ScriptStream<'_>,
        ctx: &mut ParseCtx<'_>,
    ) -> Result<(), ScriptError> {
        stream.eat_white();
        if stream.peek() != Some('=') && stream.peek() != Some('(') {
            object.set_name(stream.read_token());
        }
        stream.eat_white();
        if stream.peek() == Some('=') {
            stream.get();
        }
        let expression = Expression::parse(stream, None, false)?;
        ctx.expressions.push(expression);
        self.expr = Some(ctx.expressions.len() - 1);
        object.set_visible(false);
        Ok(())
    }

    pub fn run(&mut self, device: &str) -> Vec<Effect> {
        match self.expr {
            Some(expr) => vec![Effect::RunExpression {
                device: device.to_string(),
                expr,
            }],
            None => Vec::new(),
        }
    }
}
