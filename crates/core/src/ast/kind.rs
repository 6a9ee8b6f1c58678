use serde::Serialize;

/// Syntactic kind of an AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    // Files and declarations
    CompilationUnit,
    Namespace,
    Class,
    Interface,
    Trait,
    AnonymousClass,
    Method,
    Function,
    Closure,
    ArrowFunction,
    ClosureUses,
    FieldDeclaration,
    VariableDeclarator,
    ConstantDefinition,
    ConstantDeclarator,
    FormalParameters,
    FormalParameter,
    TraitUseStatement,
    TraitAdaptation,
    TraitAdaptationAlias,
    TraitAdaptationPrecedence,

    // Type references and hints
    ClassReference,
    ClassOrInterfaceReference,
    TraitReference,
    SelfReference,
    ParentReference,
    StaticReference,
    ScalarType,
    TypeArray,
    TypeCallable,
    NullableType,
    UnionType,

    // Statements
    ScopeStatement,
    Statement,
    IfStatement,
    ElseIfStatement,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInit,
    ForUpdate,
    ForeachStatement,
    SwitchStatement,
    SwitchLabel,
    TryStatement,
    CatchStatement,
    FinallyStatement,
    ThrowStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    EchoStatement,
    GlobalStatement,
    StaticVariableDeclaration,
    UnsetStatement,
    DeclareStatement,
    GotoStatement,
    LabelStatement,
    InlineHtml,

    // Expressions
    Expression,
    AssignmentExpression,
    BooleanAndExpression,
    BooleanOrExpression,
    LogicalAndExpression,
    LogicalOrExpression,
    LogicalXorExpression,
    ConditionalExpression,
    BinaryExpression,
    UnaryExpression,
    PreIncrementExpression,
    PreDecrementExpression,
    PostfixExpression,
    CastExpression,
    CloneExpression,
    InstanceOfExpression,
    AllocationExpression,
    Variable,
    VariableVariable,
    CompoundVariable,
    MemberPrimaryPrefix,
    PropertyPostfix,
    MethodPostfix,
    ConstantPostfix,
    FunctionPostfix,
    Arguments,
    ArrayIndexExpression,
    Array,
    ArrayElement,
    Literal,
    ConstantReference,
    Identifier,
    IssetExpression,
    EmptyExpression,
    ListExpression,
    EvalExpression,
    ExitExpression,
    IncludeExpression,
    RequireExpression,
    PrintExpression,
    YieldExpression,
    MatchExpression,
    MatchArm,
}

impl NodeKind {
    /// Kinds that stand for a whole statement inside a body.
    pub fn is_statement(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            ScopeStatement
                | Statement
                | IfStatement
                | ElseIfStatement
                | WhileStatement
                | DoWhileStatement
                | ForStatement
                | ForeachStatement
                | SwitchStatement
                | TryStatement
                | ThrowStatement
                | ReturnStatement
                | BreakStatement
                | ContinueStatement
                | EchoStatement
                | GlobalStatement
                | StaticVariableDeclaration
                | UnsetStatement
                | DeclareStatement
                | GotoStatement
                | LabelStatement
                | InlineHtml
        )
    }

    /// Kinds whose node carries a named-type reference.
    pub fn is_type_reference(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            ClassReference
                | ClassOrInterfaceReference
                | TraitReference
                | SelfReference
                | ParentReference
                | StaticReference
        )
    }
}
