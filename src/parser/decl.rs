//! Declaration grammar shared by Java and C#: type declarations and their
//! bodies, members, parameter lists and type references.

use crate::diagnostics::SyntaxError;
use crate::lexer::{Token, TokenKind};
use crate::model::{Parameter, Span, Variant};

use super::modifiers::ResolvedPrefix;
use super::tree::{
    ConstructorDecl, DeclId, DeclKind, EnumConstantDecl, FieldDecl, MethodDecl, TypeDecl, TypeKind,
};
use super::{PResult, ParseFailure, Parser};

/// Identifier text without C#'s verbatim `@` marker.
pub(super) fn name_of<'src>(tok: Token<'src>) -> &'src str {
    tok.text.strip_prefix('@').unwrap_or(tok.text)
}

impl<'src> Parser<'src> {
    /// One declaration inside `parent`: a type, a member or an initializer
    /// block. At file level only types (and C# delegates) are accepted.
    pub(super) fn member(&mut self, parent: DeclId) -> PResult<()> {
        let start = self.here().start;
        let doc = self.doc_before(self.pos);
        let prefix = self.prefix();

        if let Some(kind) = self.type_start() {
            return self.type_decl(parent, kind, prefix, start, doc).map(|_| ());
        }
        if parent == self.tree.root() && !(self.is_csharp() && prefix.has("delegate")) {
            return Err(self.expected("a type declaration", "at file level"));
        }
        if self.is_java() && self.at("{") {
            self.skip_block()?;
            return Ok(());
        }
        match self.variant() {
            Variant::Java => self.java_member(parent, prefix, start, doc),
            Variant::CSharp => self.csharp_member(parent, prefix, start, doc),
        }
    }

    pub(super) fn type_start(&self) -> Option<TypeKind> {
        let tok = self.peek()?;
        if tok.kind == TokenKind::Keyword {
            return match tok.text {
                "class" => Some(TypeKind::Class),
                "interface" => Some(TypeKind::Interface),
                "enum" => Some(TypeKind::Enum),
                "struct" if self.is_csharp() => Some(TypeKind::Struct),
                _ => None,
            };
        }
        if self.is_java() && tok.is_punct("@") && self.at_n_word(1, "interface") {
            return Some(TypeKind::Annotation);
        }
        if tok.is_ident() && tok.text == "record" {
            let next = self.peek_n(1)?;
            let named = next.is_ident()
                || (self.is_csharp() && (next.is_keyword("class") || next.is_keyword("struct")));
            if named {
                return Some(TypeKind::Record);
            }
        }
        None
    }

    fn type_decl(
        &mut self,
        parent: DeclId,
        kind: TypeKind,
        prefix: ResolvedPrefix,
        start: usize,
        doc: Option<String>,
    ) -> PResult<DeclId> {
        match kind {
            TypeKind::Annotation => self.pos += 2,
            TypeKind::Record => {
                self.pos += 1;
                if self.at_word("class") || self.at_word("struct") {
                    self.pos += 1;
                }
            }
            _ => self.pos += 1,
        }
        let name = self.expect_ident("type name")?;
        let mut decl = TypeDecl::new(kind);
        if self.at("<") {
            decl.type_params = Some(self.type_args()?);
        }
        let id = self.tree.add(
            parent,
            name_of(name),
            DeclKind::Type(decl),
            &prefix,
            Span::new(start, name.span.end),
            doc,
        );
        self.type_rest(id, kind).map_err(|f| f.with_node(id))?;
        Ok(id)
    }

    fn type_rest(&mut self, id: DeclId, kind: TypeKind) -> PResult<()> {
        if self.at("(") && (kind == TypeKind::Record || self.is_csharp()) {
            let params = self.params("(", ")")?;
            if kind == TypeKind::Record {
                self.record_components(id, params);
            }
        }
        match self.variant() {
            Variant::Java => self.java_type_clauses(id, kind)?,
            Variant::CSharp => self.csharp_type_clauses(id, kind)?,
        }
        if self.at("{") {
            return self.type_body(id);
        }
        if self.is_csharp() && self.eat(";") {
            let end = self.prev_end();
            self.tree.set_end(id, end);
            return Ok(());
        }
        let context = format!("to open the body of `{}`", self.tree.get(id).name);
        Err(self.expected("`{`", &context))
    }

    fn record_components(&mut self, id: DeclId, params: Vec<(Parameter, Span)>) {
        let property = self.is_csharp();
        for (param, span) in params {
            self.tree.add(
                id,
                param.name,
                DeclKind::Field(FieldDecl {
                    type_name: param.type_name,
                    has_initializer: false,
                    property,
                    component: true,
                }),
                &ResolvedPrefix::default(),
                span,
                None,
            );
        }
    }

    /// `{ members }` of a type or enum constant; sets the owner's end.
    pub(super) fn type_body(&mut self, owner: DeclId) -> PResult<()> {
        let open = self.here();
        self.pos += 1;
        let name = self.tree.get(owner).name.clone();
        if self.tree.get(owner).type_kind() == Some(TypeKind::Enum) {
            self.enum_constants(owner);
        }
        loop {
            if let Some(id) = self.unwinding {
                let error = SyntaxError::new(format!("missing `}}` for `{}`", name), open);
                return Err(ParseFailure::reported(error, id));
            }
            if self.at_eof() {
                let message = format!("unexpected end of input: missing `}}` for `{}`", name);
                return Err(self.unclosed(open, message));
            }
            if self.at_dedented_decl() {
                return Err(self.unclosed(open, format!("missing `}}` for `{}`", name)));
            }
            if self.eat("}") {
                let end = self.prev_end();
                self.tree.set_end(owner, end);
                return Ok(());
            }
            if self.eat(";") {
                continue;
            }
            let start = self.pos;
            if let Err(failure) = self.member(owner) {
                self.recover(failure, start);
            }
        }
    }

    /// Enum constant list; stops after the `;` that ends it or before `}`.
    fn enum_constants(&mut self, owner: DeclId) {
        loop {
            if self.unwinding.is_some()
                || self.at_eof()
                || self.at("}")
                || self.at_dedented_decl()
                || self.eat(";")
            {
                return;
            }
            let start = self.pos;
            let failure = match self.enum_constant(owner) {
                Ok(()) if self.eat(",") => continue,
                Ok(()) if self.at("}") || self.eat(";") => return,
                Ok(()) => self.expected("`,`, `;` or `}`", "after enum constant"),
                Err(failure) => failure,
            };
            self.recover(failure, start);
            let after_semicolon = self
                .pos
                .checked_sub(1)
                .is_some_and(|p| self.all[self.sig[p]].is_punct(";"));
            if after_semicolon {
                return;
            }
        }
    }

    fn enum_constant(&mut self, owner: DeclId) -> PResult<()> {
        let start = self.here().start;
        let doc = self.doc_before(self.pos);
        let prefix = self.prefix();
        let name = self.expect_ident("enum constant name")?;
        let id = self.tree.add(
            owner,
            name_of(name),
            DeclKind::EnumConstant(EnumConstantDecl {
                arguments: None,
                body: None,
            }),
            &prefix,
            Span::new(start, name.span.end),
            doc,
        );
        self.enum_constant_rest(id).map_err(|f| f.with_node(id))
    }

    fn enum_constant_rest(&mut self, id: DeclId) -> PResult<()> {
        let mut arguments = None;
        let mut body = None;
        if self.is_java() && self.at("(") {
            let group = self.skip_group("(", ")")?;
            arguments = Some(self.source[group.start + 1..group.end - 1].trim().to_string());
        }
        if self.is_java() && self.at("{") {
            let open = self.here().start;
            self.type_body(id)?;
            body = Some(Span::new(open, self.prev_end()));
        }
        if self.is_csharp() && self.eat("=") && self.skip_expression(true) == 0 {
            return Err(self.expected("a constant value", "after `=`"));
        }
        if let DeclKind::EnumConstant(constant) = &mut self.tree.get_mut(id).kind {
            constant.arguments = arguments;
            constant.body = body;
        }
        let end = self.prev_end();
        self.tree.set_end(id, end);
        Ok(())
    }

    // ---- members ----

    pub(super) fn is_record(&self, id: DeclId) -> bool {
        self.tree.get(id).type_kind() == Some(TypeKind::Record)
    }

    /// `Name(params) [throws] body`. A name that differs from the enclosing
    /// type still yields a constructor node, flagged partial.
    pub(super) fn constructor(
        &mut self,
        parent: DeclId,
        prefix: ResolvedPrefix,
        start: usize,
        doc: Option<String>,
        with_params: bool,
    ) -> PResult<()> {
        let name = self.expect_ident("constructor name")?;
        let id = self.tree.add(
            parent,
            name_of(name),
            DeclKind::Constructor(ConstructorDecl {
                params: Vec::new(),
                throws: Vec::new(),
                body: None,
            }),
            &prefix,
            Span::new(start, name.span.end),
            doc,
        );
        let owner = self.tree.get(parent);
        if owner.type_decl().is_none() || owner.name != name_of(name) {
            let diag = self.diagnostics.syntax(&SyntaxError::new(
                "invalid method declaration; return type required",
                name.span,
            ));
            self.tree.mark_partial(id, diag, name.span.end);
        }
        self.constructor_rest(id, with_params)
            .map_err(|f| f.with_node(id))
    }

    fn constructor_rest(&mut self, id: DeclId, with_params: bool) -> PResult<()> {
        let params = if with_params {
            self.params("(", ")")?.into_iter().map(|(p, _)| p).collect()
        } else {
            Vec::new()
        };
        let throws = self.throws_clause()?;
        if self.is_csharp() && self.eat(":") {
            if !(self.eat_word("base") || self.eat_word("this")) {
                return Err(self.expected("`base` or `this`", "in constructor initializer"));
            }
            if !self.at("(") {
                return Err(self.expected("`(`", "in constructor initializer"));
            }
            self.skip_group("(", ")")?;
        }
        let body = self.callable_body()?;
        if let DeclKind::Constructor(ctor) = &mut self.tree.get_mut(id).kind {
            ctor.params = params;
            ctor.throws = throws;
            ctor.body = body;
        }
        let end = self.prev_end();
        self.tree.set_end(id, end);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn method(
        &mut self,
        parent: DeclId,
        prefix: ResolvedPrefix,
        start: usize,
        doc: Option<String>,
        name: &str,
        name_span: Span,
        return_type: String,
        type_params: Option<String>,
    ) -> PResult<()> {
        let id = self.tree.add(
            parent,
            name,
            DeclKind::Method(MethodDecl {
                return_type,
                type_params,
                params: Vec::new(),
                throws: Vec::new(),
                is_override: prefix.is_override,
                body: None,
                default_value: None,
            }),
            &prefix,
            Span::new(start, name_span.end),
            doc,
        );
        self.method_rest(id).map_err(|f| f.with_node(id))
    }

    fn method_rest(&mut self, id: DeclId) -> PResult<()> {
        let params: Vec<Parameter> = self.params("(", ")")?.into_iter().map(|(p, _)| p).collect();
        let mut dims = String::new();
        self.array_dims(&mut dims);
        let throws = self.throws_clause()?;
        let mut default_value = None;
        if self.is_java() && self.eat_word("default") {
            let from = self.here().start;
            if self.skip_expression(false) == 0 {
                return Err(self.expected("a default value", "after `default`"));
            }
            default_value = Some(self.source[from..self.prev_end()].trim().to_string());
        }
        if self.is_csharp() {
            self.skip_constraints();
        }
        let body = self.callable_body()?;
        if let DeclKind::Method(method) = &mut self.tree.get_mut(id).kind {
            method.params = params;
            method.return_type.push_str(&dims);
            method.throws = throws;
            method.default_value = default_value;
            method.body = body;
        }
        let end = self.prev_end();
        self.tree.set_end(id, end);
        Ok(())
    }

    fn throws_clause(&mut self) -> PResult<Vec<String>> {
        if self.is_java() && self.eat_word("throws") {
            self.type_list()
        } else {
            Ok(Vec::new())
        }
    }

    /// Block body, C# expression body, or `;`.
    fn callable_body(&mut self) -> PResult<Option<Span>> {
        if self.at("{") {
            return self.skip_block().map(Some);
        }
        if self.is_csharp() && self.at("=>") {
            let start = self.here().start;
            self.pos += 1;
            if self.skip_expression(false) == 0 {
                return Err(self.expected("an expression", "after `=>`"));
            }
            self.expect(";", "after expression body")?;
            return Ok(Some(Span::new(start, self.prev_end())));
        }
        if self.eat(";") {
            return Ok(None);
        }
        if self.is_csharp() {
            Err(self.expected("`{`, `=>` or `;`", "after method declaration"))
        } else {
            Err(self.expected("`{` or `;`", "after method declaration"))
        }
    }

    /// One or more declarators sharing a type: `int a = 1, b[], c;`.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn fields(
        &mut self,
        parent: DeclId,
        prefix: ResolvedPrefix,
        start: usize,
        doc: Option<String>,
        first: Token<'src>,
        type_name: String,
        property: bool,
    ) -> PResult<()> {
        let mut declared = Vec::new();
        let mut name = first;
        loop {
            let mut field_type = type_name.clone();
            if self.is_java() {
                self.array_dims(&mut field_type);
            }
            let id = self.tree.add(
                parent,
                name_of(name),
                DeclKind::Field(FieldDecl {
                    type_name: field_type,
                    has_initializer: false,
                    property,
                    component: false,
                }),
                &prefix,
                Span::new(start, name.span.end),
                doc.clone(),
            );
            declared.push(id);
            self.declarator_init(id).map_err(|f| f.with_node(id))?;
            if self.eat(",") {
                name = self
                    .expect_ident("field name")
                    .map_err(|f| f.with_node(id))?;
                continue;
            }
            self.expect(";", "after field declaration")
                .map_err(|f| f.with_node(id))?;
            break;
        }
        let end = self.prev_end();
        for id in declared {
            self.tree.set_end(id, end);
        }
        Ok(())
    }

    fn declarator_init(&mut self, id: DeclId) -> PResult<()> {
        if !self.eat("=") {
            return Ok(());
        }
        if self.skip_expression(false) == 0 {
            return Err(self.expected("initializer expression", "after `=`"));
        }
        if let DeclKind::Field(field) = &mut self.tree.get_mut(id).kind {
            field.has_initializer = true;
        }
        Ok(())
    }

    /// Skip an expression up to a `;`, `)` or `}` at depth zero, or a `,`
    /// at depth zero: any comma when `any_comma`, otherwise only one that
    /// starts the next declarator. Returns the number of tokens skipped.
    pub(super) fn skip_expression(&mut self, any_comma: bool) -> usize {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            if depth == 0 {
                if tok.is_punct(";") || tok.is_punct("}") || tok.is_punct(")") {
                    break;
                }
                if tok.is_punct(",") && (any_comma || self.next_is_declarator()) {
                    break;
                }
            }
            if self.at_dedented_decl() {
                break;
            }
            self.pos += 1;
            if tok.is_punct("(") || tok.is_punct("[") || tok.is_punct("{") {
                depth += 1;
            } else if tok.is_punct(")") || tok.is_punct("]") || tok.is_punct("}") {
                depth = depth.saturating_sub(1);
            }
        }
        self.pos - start
    }

    /// At `,` followed by `name =`, `name,`, `name;` or `name[`.
    fn next_is_declarator(&self) -> bool {
        self.peek_n(1).is_some_and(|t| t.is_ident())
            && self.peek_n(2).is_some_and(|t| {
                t.is_punct("=") || t.is_punct(",") || t.is_punct(";") || t.is_punct("[")
            })
    }

    // ---- parameters and types ----

    /// Parameter list delimited by `open`/`close`, with each parameter's span.
    pub(super) fn params(&mut self, open: &str, close: &str) -> PResult<Vec<(Parameter, Span)>> {
        self.expect(open, "to start the parameter list")?;
        let mut params = Vec::new();
        if self.eat(close) {
            return Ok(params);
        }
        loop {
            let start = self.here().start;
            let mut varargs = self.param_modifiers();
            let mut type_name = self.type_ref()?;
            if self.is_java() && self.eat("...") {
                varargs = true;
            }
            let name = if self.is_java() && self.eat_word("this") {
                "this".to_string()
            } else {
                name_of(self.expect_ident("parameter name")?).to_string()
            };
            self.array_dims(&mut type_name);
            if self.is_csharp() && self.eat("=") && self.skip_expression(true) == 0 {
                return Err(self.expected("a default value", "after `=`"));
            }
            params.push((
                Parameter {
                    name,
                    type_name,
                    varargs,
                },
                Span::new(start, self.prev_end()),
            ));
            if self.eat(",") {
                continue;
            }
            if self.eat(close) {
                return Ok(params);
            }
            return Err(self.expected(&format!("`,` or `{}`", close), "in parameter list"));
        }
    }

    /// Annotations and modifiers in front of a parameter. Returns whether
    /// C# `params` was among them.
    fn param_modifiers(&mut self) -> bool {
        let mut varargs = false;
        loop {
            if self.is_java() && self.at("@") {
                self.skip_annotation();
                continue;
            }
            if self.is_csharp() && self.at("[") {
                if self.skip_group("[", "]").is_err() {
                    break;
                }
                continue;
            }
            let Some(tok) = self.peek() else {
                break;
            };
            let modifier = match self.variant() {
                Variant::Java => tok.is_word("final"),
                Variant::CSharp => ["this", "ref", "out", "in", "params", "scoped", "readonly"]
                    .iter()
                    .any(|m| tok.is_word(m)),
            };
            if !modifier {
                break;
            }
            varargs |= tok.is_word("params");
            self.pos += 1;
        }
        varargs
    }

    /// Trailing `[]` pairs, appended to `type_name`.
    pub(super) fn array_dims(&mut self, type_name: &mut String) {
        loop {
            self.skip_dim_annotations();
            if !(self.at("[") && self.at_n(1, "]")) {
                break;
            }
            self.pos += 2;
            type_name.push_str("[]");
        }
    }

    /// Java type-use annotations on an array dimension: `String @NonNull []`.
    /// Nothing is consumed unless a `[` follows them.
    fn skip_dim_annotations(&mut self) {
        if !self.is_java() {
            return;
        }
        let save = self.pos;
        while self.at("@") && !self.at_n_word(1, "interface") {
            self.skip_annotation();
        }
        if !self.at("[") {
            self.pos = save;
        }
    }

    /// A type reference: `int`, `a.b.C<T>[]`, C# `int?`, `(int, string)`.
    pub(super) fn type_ref(&mut self) -> PResult<String> {
        if self.is_java() {
            while self.at("@") && !self.at_n_word(1, "interface") {
                self.skip_annotation();
            }
        }
        let start = self.pos;
        if self.is_csharp() && self.at("(") {
            self.skip_group("(", ")")?;
        } else {
            match self.peek() {
                Some(tok)
                    if tok.is_ident()
                        || (tok.kind == TokenKind::Keyword && self.dialect.is_primitive(tok.text)) =>
                {
                    self.pos += 1;
                }
                _ => return Err(self.expected("a type", "")),
            }
            loop {
                if self.at("<") {
                    self.type_args()?;
                } else if (self.at(".") || self.at("::")) && self.peek_n(1).is_some_and(|t| t.is_ident()) {
                    self.pos += 2;
                } else {
                    break;
                }
            }
        }
        let mut type_name = self.text_from(start);
        loop {
            self.skip_dim_annotations();
            if self.at("[") && (self.at_n(1, "]") || self.at_n(1, ",")) {
                self.pos += 1;
                type_name.push('[');
                while self.eat(",") {
                    type_name.push(',');
                }
                self.expect("]", "in array type")?;
                type_name.push(']');
            } else if self.is_csharp() && (self.at("?") || self.at("*")) {
                if let Some(tok) = self.peek() {
                    type_name.push_str(tok.text);
                }
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(type_name)
    }

    /// Balanced `<...>` starting at the current `<`, as text.
    pub(super) fn type_args(&mut self) -> PResult<String> {
        let start = self.pos;
        let open = self.here();
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            if tok.is_punct(";")
                || tok.is_punct("{")
                || tok.is_punct("}")
                || tok.is_punct("=")
                || tok.is_punct("=>")
            {
                break;
            }
            self.pos += 1;
            if tok.is_punct("<") {
                depth += 1;
            } else if tok.is_punct(">") {
                depth -= 1;
                if depth == 0 {
                    return Ok(self.text_from(start));
                }
            }
        }
        Err(ParseFailure::new(SyntaxError::new(
            "unclosed `<` in type arguments",
            Span::new(open.start, self.prev_end().max(open.end)),
        )))
    }

    pub(super) fn type_list(&mut self) -> PResult<Vec<String>> {
        let mut types = vec![self.type_ref()?];
        while self.eat(",") {
            types.push(self.type_ref()?);
        }
        Ok(types)
    }
}
