

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Int(i64),
    String(String),
    Vec(Vec<Val>),
    None,
}

impl Val {
    pub fn i64(&self) -> i64 {
        match self {
            Val::Int(i) => *i,
            _ => panic!("Val is not an integer: {:?}", self),
        }
    }
}
