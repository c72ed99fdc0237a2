//! XML Schema (XSD 1.0) subset: loading and document validation.
//!
//! Supported constructs:
//!
//! - global `xs:element` declarations, local `xs:element` with `name` or `ref`
//!   and `minOccurs` / `maxOccurs` (including `unbounded`)
//! - named and anonymous `xs:complexType` holding an optional `xs:sequence`
//!   of elements followed by `xs:attribute` declarations
//! - named and anonymous `xs:simpleType` with an `xs:restriction` carrying
//!   `pattern`, `enumeration`, `length`, `minLength`, `maxLength`,
//!   `totalDigits`, `fractionDigits`, `minInclusive` and `maxInclusive`
//! - built-in types `string`, `normalizedString`, `token`, `date`, `decimal`,
//!   `integer`, `nonNegativeInteger`, `positiveInteger`, `boolean`, `anyType`
//!
//! Schemas must not declare a `targetNamespace`. Anything outside the subset
//! is rejected with [`SchemaError::Unsupported`] instead of being ignored.
//! Sequences are matched greedily, which is exact for schemas that satisfy
//! the unique particle attribution rule.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::dom::{self, XmlNode};
use crate::error::SchemaError;

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

static DECIMAL_LEXICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$").expect("Invalid decimal regex")
});

static INTEGER_LEXICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("Invalid integer regex"));

static DATE_LEXICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<y>-?[0-9]{4,})-(?P<m>[0-9]{2})-(?P<d>[0-9]{2})(?:Z|[+-](?:(?:0[0-9]|1[0-3]):[0-5][0-9]|14:00))?$",
    )
    .expect("Invalid xs:date regex")
});

/// One way a document departs from the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Element path such as `/Journal/Entry[2]/Amount[1]`.
    pub path: String,
    pub message: String,
}

impl Violation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    String,
    NormalizedString,
    Token,
    Date,
    Decimal,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    Boolean,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "string" => Self::String,
            "normalizedString" => Self::NormalizedString,
            "token" => Self::Token,
            "date" => Self::Date,
            "decimal" => Self::Decimal,
            "integer" => Self::Integer,
            "nonNegativeInteger" => Self::NonNegativeInteger,
            "positiveInteger" => Self::PositiveInteger,
            "boolean" => Self::Boolean,
            _ => return None,
        };
        Some(builtin)
    }

    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::NormalizedString => "normalizedString",
            Self::Token => "token",
            Self::Date => "date",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::NonNegativeInteger => "nonNegativeInteger",
            Self::PositiveInteger => "positiveInteger",
            Self::Boolean => "boolean",
        }
    }

    /// Apply the type's whiteSpace facet (`preserve`, `replace` or `collapse`).
    fn normalize(self, raw: &str) -> String {
        match self {
            Self::String => raw.to_string(),
            Self::NormalizedString => raw.replace(['\t', '\n', '\r'], " "),
            _ => raw
                .split([' ', '\t', '\n', '\r'])
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            Self::String | Self::NormalizedString | Self::Token => true,
            Self::Date => parse_date(value).is_some(),
            Self::Decimal => DECIMAL_LEXICAL.is_match(value),
            Self::Integer => INTEGER_LEXICAL.is_match(value),
            Self::NonNegativeInteger => {
                INTEGER_LEXICAL.is_match(value)
                    && value
                        .strip_prefix('-')
                        .is_none_or(|digits| digits.bytes().all(|b| b == b'0'))
            }
            Self::PositiveInteger => {
                INTEGER_LEXICAL.is_match(value)
                    && !value.starts_with('-')
                    && value.bytes().any(|b| (b'1'..=b'9').contains(&b))
            }
            Self::Boolean => matches!(value, "true" | "false" | "1" | "0"),
        }
    }

    fn is_decimal(self) -> bool {
        matches!(
            self,
            Self::Decimal | Self::Integer | Self::NonNegativeInteger | Self::PositiveInteger
        )
    }

    fn is_ordered(self) -> bool {
        self.is_decimal() || self == Self::Date
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let caps = DATE_LEXICAL.captures(value)?;
    let year: i32 = caps["y"].parse().ok()?;
    if year == 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, caps["m"].parse().ok()?, caps["d"].parse().ok()?)
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    let unsigned = value.strip_prefix('+').unwrap_or(value);
    let (sign, digits) = match unsigned.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", unsigned),
    };
    let digits = digits.strip_suffix('.').unwrap_or(digits);
    let text = if digits.starts_with('.') {
        format!("{sign}0{digits}")
    } else {
        format!("{sign}{digits}")
    };
    Decimal::from_str(&text).ok()
}

fn compare(builtin: Builtin, left: &str, right: &str) -> Option<Ordering> {
    if builtin.is_decimal() {
        Some(parse_decimal(left)?.cmp(&parse_decimal(right)?))
    } else if builtin == Builtin::Date {
        Some(parse_date(left)?.cmp(&parse_date(right)?))
    } else {
        None
    }
}

/// Significant digits in total and after the decimal point.
fn digit_counts(value: &str) -> (usize, usize) {
    let unsigned = value.trim_start_matches(['+', '-']);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let whole = whole.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');
    ((whole.len() + fraction.len()).max(1), fraction.len())
}

#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// XSD patterns always match the whole value.
    fn compile(source: &str) -> Result<Self, SchemaError> {
        let regex =
            Regex::new(&format!("^(?:{source})$")).map_err(|error| SchemaError::Pattern {
                pattern: source.to_string(),
                source: error,
            })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }
}

/// Facets from one restriction step.
#[derive(Debug, Clone, Default)]
struct Facets {
    /// Alternatives; the value must match at least one.
    patterns: Vec<Pattern>,
    enumeration: Vec<String>,
    length: Option<usize>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    total_digits: Option<usize>,
    fraction_digits: Option<usize>,
    min_inclusive: Option<String>,
    max_inclusive: Option<String>,
}

impl Facets {
    fn check(&self, builtin: Builtin, value: &str, problems: &mut Vec<String>) {
        if !self.patterns.is_empty() && !self.patterns.iter().any(|p| p.regex.is_match(value)) {
            let sources: Vec<&str> = self.patterns.iter().map(|p| p.source.as_str()).collect();
            problems.push(format!(
                "'{value}' does not match pattern '{}'",
                sources.join("' or '")
            ));
        }
        if !self.enumeration.is_empty() && !self.enumeration.iter().any(|allowed| allowed == value)
        {
            problems.push(format!(
                "'{value}' is not one of [{}]",
                self.enumeration.join(", ")
            ));
        }

        let length = value.chars().count();
        if let Some(expected) = self.length
            && length != expected
        {
            problems.push(format!("length {length} differs from required length {expected}"));
        }
        if let Some(min) = self.min_length
            && length < min
        {
            problems.push(format!("length {length} is below minLength {min}"));
        }
        if let Some(max) = self.max_length
            && length > max
        {
            problems.push(format!("length {length} exceeds maxLength {max}"));
        }

        if builtin.is_decimal() {
            let (total, fraction) = digit_counts(value);
            if let Some(max) = self.total_digits
                && total > max
            {
                problems.push(format!("'{value}' has {total} digits, totalDigits is {max}"));
            }
            if let Some(max) = self.fraction_digits
                && fraction > max
            {
                problems.push(format!(
                    "'{value}' has {fraction} fraction digits, fractionDigits is {max}"
                ));
            }
        }

        if let Some(bound) = &self.min_inclusive
            && !matches!(
                compare(builtin, value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            )
        {
            problems.push(format!("'{value}' is below minInclusive {bound}"));
        }
        if let Some(bound) = &self.max_inclusive
            && !matches!(
                compare(builtin, value, bound),
                Some(Ordering::Less | Ordering::Equal)
            )
        {
            problems.push(format!("'{value}' is above maxInclusive {bound}"));
        }
    }
}

/// A built-in type narrowed by zero or more restriction steps, base first.
#[derive(Debug, Clone)]
struct SimpleType {
    builtin: Builtin,
    layers: Vec<Facets>,
}

impl SimpleType {
    fn builtin(builtin: Builtin) -> Self {
        Self {
            builtin,
            layers: Vec::new(),
        }
    }

    fn check(&self, raw: &str) -> Vec<String> {
        let value = self.builtin.normalize(raw);
        if !self.builtin.accepts(&value) {
            return vec![format!("'{value}' is not a valid {}", self.builtin.name())];
        }
        let mut problems = Vec::new();
        for facets in &self.layers {
            facets.check(self.builtin, &value, &mut problems);
        }
        problems
    }
}

#[derive(Debug, Clone)]
enum Content {
    Any,
    Simple(SimpleType),
    Complex(ComplexType),
    /// A named complex type, looked up at validation time so types may recurse.
    Named(String),
}

#[derive(Debug, Clone)]
struct ElementDecl {
    content: Content,
}

#[derive(Debug, Clone)]
enum ParticleElement {
    Local { name: String, decl: ElementDecl },
    Ref(String),
}

#[derive(Debug, Clone)]
struct Particle {
    element: ParticleElement,
    min_occurs: u32,
    /// `None` is `unbounded`.
    max_occurs: Option<u32>,
}

impl Particle {
    fn name(&self) -> &str {
        match &self.element {
            ParticleElement::Local { name, .. } | ParticleElement::Ref(name) => name,
        }
    }
}

#[derive(Debug, Clone)]
struct AttributeDecl {
    name: String,
    ty: SimpleType,
    required: bool,
}

#[derive(Debug, Clone, Default)]
struct ComplexType {
    particles: Vec<Particle>,
    attributes: Vec<AttributeDecl>,
}

/// A compiled schema ready to validate documents.
#[derive(Debug, Clone)]
pub struct XmlSchema {
    elements: HashMap<String, ElementDecl>,
    complex_types: HashMap<String, ComplexType>,
}

impl XmlSchema {
    /// Load and compile a schema file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not well-formed, or
    /// uses constructs outside the supported subset.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let text = fs::read(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::parse(&text)?;
        debug!(
            path = %path.display(),
            elements = schema.elements.len(),
            types = schema.complex_types.len(),
            "loaded XML schema"
        );
        Ok(schema)
    }

    /// Compile a schema from its XML text.
    ///
    /// # Errors
    ///
    /// See [`XmlSchema::from_path`].
    pub fn parse(document: &[u8]) -> Result<Self, SchemaError> {
        let root = dom::parse(document)?;
        Builder::new(&root)?.build()
    }

    /// Whether `name` is declared as a global element.
    pub fn declares(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// Validate a document, returning every violation found.
    ///
    /// A document that is not well-formed yields a single violation at `/`.
    pub fn validate(&self, document: &[u8]) -> Vec<Violation> {
        let root = match dom::parse(document) {
            Ok(root) => root,
            Err(error) => {
                return vec![Violation::new(
                    "/",
                    format!("document is not well-formed: {error}"),
                )];
            }
        };
        let mut violations = Vec::new();
        let path = format!("/{}", root.name);
        match self.elements.get(&root.name) {
            Some(decl) => self.check_element(&decl.content, &root, &path, &mut violations),
            None => violations.push(Violation::new(
                path,
                format!("no global declaration for element <{}>", root.name),
            )),
        }
        violations
    }

    fn check_element(
        &self,
        content: &Content,
        node: &XmlNode,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        match content {
            Content::Any => {}
            Content::Simple(ty) => {
                for (key, _) in &node.attributes {
                    if !is_namespace_attribute(key) {
                        out.push(Violation::new(path, format!("attribute '{key}' is not declared")));
                    }
                }
                if let Some(child) = node.children.first() {
                    out.push(Violation::new(
                        path,
                        format!("element <{}> not allowed in simple content", child.name),
                    ));
                }
                for problem in ty.check(&node.text) {
                    out.push(Violation::new(path, problem));
                }
            }
            Content::Complex(ty) => self.check_complex(ty, node, path, out),
            Content::Named(name) => match self.complex_types.get(name) {
                Some(ty) => self.check_complex(ty, node, path, out),
                None => out.push(Violation::new(path, format!("unknown type '{name}'"))),
            },
        }
    }

    fn check_complex(&self, ty: &ComplexType, node: &XmlNode, path: &str, out: &mut Vec<Violation>) {
        self.check_attributes(ty, node, path, out);
        if node.has_text() {
            out.push(Violation::new(
                path,
                "character data not allowed in element-only content",
            ));
        }

        let children = &node.children;
        let mut index = 0;
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for particle in &ty.particles {
            let name = particle.name();
            let mut count = 0u32;
            while index < children.len()
                && children[index].name == name
                && particle.max_occurs.is_none_or(|max| count < max)
            {
                let child = &children[index];
                let position = positions.entry(child.name.as_str()).or_insert(0);
                *position += 1;
                let child_path = format!("{path}/{}[{position}]", child.name);
                match self.particle_content(particle) {
                    Some(content) => self.check_element(content, child, &child_path, out),
                    None => out.push(Violation::new(
                        child_path,
                        format!("no declaration for element <{name}>"),
                    )),
                }
                index += 1;
                count += 1;
            }
            if count < particle.min_occurs {
                let message = if count == 0 {
                    format!("missing required element <{name}>")
                } else {
                    format!(
                        "expected at least {} <{name}> elements, found {count}",
                        particle.min_occurs
                    )
                };
                out.push(Violation::new(path, message));
            }
        }
        for child in &children[index..] {
            out.push(Violation::new(
                path,
                format!("unexpected element <{}>", child.name),
            ));
        }
    }

    fn check_attributes(&self, ty: &ComplexType, node: &XmlNode, path: &str, out: &mut Vec<Violation>) {
        for (key, value) in &node.attributes {
            if is_namespace_attribute(key) {
                continue;
            }
            match ty.attributes.iter().find(|decl| decl.name == *key) {
                Some(decl) => {
                    for problem in decl.ty.check(value) {
                        out.push(Violation::new(path, format!("attribute '{key}': {problem}")));
                    }
                }
                None => out.push(Violation::new(path, format!("attribute '{key}' is not declared"))),
            }
        }
        for decl in ty.attributes.iter().filter(|decl| decl.required) {
            if node.attribute(&decl.name).is_none() {
                out.push(Violation::new(
                    path,
                    format!("missing required attribute '{}'", decl.name),
                ));
            }
        }
    }

    fn particle_content<'s>(&'s self, particle: &'s Particle) -> Option<&'s Content> {
        match &particle.element {
            ParticleElement::Local { decl, .. } => Some(&decl.content),
            ParticleElement::Ref(name) => self.elements.get(name).map(|decl| &decl.content),
        }
    }
}

/// Namespace declarations and `xsi:` attributes are outside any content model.
fn is_namespace_attribute(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:") || key.starts_with("xsi:")
}

enum TypeName<'q> {
    Builtin(&'q str),
    User(&'q str),
}

struct Builder<'a> {
    xsd_prefixes: HashSet<String>,
    default_is_xsd: bool,
    elements: HashMap<&'a str, &'a XmlNode>,
    simple_types: HashMap<&'a str, &'a XmlNode>,
    complex_types: HashMap<&'a str, &'a XmlNode>,
    compiled_simple: HashMap<String, SimpleType>,
    resolving: Vec<String>,
}

impl<'a> Builder<'a> {
    fn new(root: &'a XmlNode) -> Result<Self, SchemaError> {
        if root.name != "schema" {
            return Err(invalid(format!(
                "root element is <{}>, expected <schema>",
                root.name
            )));
        }
        if root.attribute("targetNamespace").is_some() {
            return Err(unsupported("targetNamespace"));
        }

        let mut xsd_prefixes = HashSet::new();
        let mut default_is_xsd = false;
        for (key, value) in &root.attributes {
            if value != XSD_NAMESPACE {
                continue;
            }
            if key == "xmlns" {
                default_is_xsd = true;
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                xsd_prefixes.insert(prefix.to_string());
            }
        }
        if xsd_prefixes.is_empty() && !default_is_xsd {
            return Err(invalid("the XML Schema namespace is not declared"));
        }

        let mut builder = Self {
            xsd_prefixes,
            default_is_xsd,
            elements: HashMap::new(),
            simple_types: HashMap::new(),
            complex_types: HashMap::new(),
            compiled_simple: HashMap::new(),
            resolving: Vec::new(),
        };
        for child in &root.children {
            let table = match child.name.as_str() {
                "annotation" => continue,
                "element" => &mut builder.elements,
                "simpleType" => &mut builder.simple_types,
                "complexType" => &mut builder.complex_types,
                other => return Err(unsupported(format!("<{other}> at schema level"))),
            };
            let name = required_attribute(child, "name")?;
            if table.insert(name, child).is_some() {
                return Err(invalid(format!("<{}> '{name}' is declared twice", child.name)));
            }
        }
        if builder.elements.is_empty() {
            return Err(invalid("no global element is declared"));
        }
        Ok(builder)
    }

    fn build(mut self) -> Result<XmlSchema, SchemaError> {
        let named_simple: Vec<&'a str> = self.simple_types.keys().copied().collect();
        for name in named_simple {
            self.named_simple(name)?;
        }

        let mut complex_types = HashMap::new();
        for (name, node) in self.complex_types.clone() {
            complex_types.insert(name.to_string(), self.complex_type(node)?);
        }

        let mut elements = HashMap::new();
        for (name, node) in self.elements.clone() {
            for key in ["minOccurs", "maxOccurs", "ref"] {
                if node.attribute(key).is_some() {
                    return Err(invalid(format!("global element '{name}' has '{key}'")));
                }
            }
            elements.insert(name.to_string(), self.element_decl(node)?);
        }

        Ok(XmlSchema {
            elements,
            complex_types,
        })
    }

    fn resolve_qname<'q>(&self, qname: &'q str) -> Result<TypeName<'q>, SchemaError> {
        match qname.split_once(':') {
            Some((prefix, local)) if self.xsd_prefixes.contains(prefix) => {
                Ok(TypeName::Builtin(local))
            }
            Some(_) => Err(unsupported(format!(
                "qualified name '{qname}' outside the XML Schema namespace"
            ))),
            None if self.default_is_xsd => Ok(TypeName::Builtin(qname)),
            None => Ok(TypeName::User(qname)),
        }
    }

    fn type_reference(&mut self, qname: &str) -> Result<Content, SchemaError> {
        match self.resolve_qname(qname.trim())? {
            TypeName::Builtin("anyType") => Ok(Content::Any),
            TypeName::Builtin(local) => Builtin::from_name(local)
                .map(|builtin| Content::Simple(SimpleType::builtin(builtin)))
                .ok_or_else(|| unsupported(format!("built-in type '{local}'"))),
            TypeName::User(local) if self.simple_types.contains_key(local) => {
                Ok(Content::Simple(self.named_simple(local)?))
            }
            TypeName::User(local) if self.complex_types.contains_key(local) => {
                Ok(Content::Named(local.to_string()))
            }
            TypeName::User(local) => Err(invalid(format!("unknown type '{local}'"))),
        }
    }

    fn element_decl(&mut self, node: &'a XmlNode) -> Result<ElementDecl, SchemaError> {
        for key in ["fixed", "nillable", "abstract", "substitutionGroup"] {
            if node.attribute(key).is_some() {
                return Err(unsupported(format!("'{key}' on <element>")));
            }
        }
        let name = required_attribute(node, "name")?;

        let mut inline = None;
        for child in &node.children {
            let content = match child.name.as_str() {
                "annotation" => continue,
                "complexType" => Content::Complex(self.complex_type(child)?),
                "simpleType" => Content::Simple(self.simple_type(child)?),
                other => return Err(unsupported(format!("<{other}> inside <element>"))),
            };
            if inline.replace(content).is_some() {
                return Err(invalid(format!("element '{name}' has more than one inline type")));
            }
        }

        let content = match (node.attribute("type"), inline) {
            (Some(_), Some(_)) => {
                return Err(invalid(format!(
                    "element '{name}' has both a type attribute and an inline type"
                )));
            }
            (Some(qname), None) => self.type_reference(qname)?,
            (None, Some(content)) => content,
            (None, None) => Content::Any,
        };
        Ok(ElementDecl { content })
    }

    fn complex_type(&mut self, node: &'a XmlNode) -> Result<ComplexType, SchemaError> {
        if node.attribute("mixed").is_some_and(|v| v.trim() == "true") {
            return Err(unsupported("mixed content"));
        }
        if node.attribute("abstract").is_some() {
            return Err(unsupported("abstract complex types"));
        }

        let mut ty = ComplexType::default();
        let mut has_sequence = false;
        for child in &node.children {
            match child.name.as_str() {
                "annotation" => {}
                "sequence" => {
                    if has_sequence || !ty.attributes.is_empty() {
                        return Err(invalid(
                            "<sequence> must appear once, before attribute declarations",
                        ));
                    }
                    has_sequence = true;
                    ty.particles = self.sequence(child)?;
                }
                "attribute" => {
                    let attribute = self.attribute_decl(child)?;
                    if ty.attributes.iter().any(|a| a.name == attribute.name) {
                        return Err(invalid(format!(
                            "attribute '{}' is declared twice",
                            attribute.name
                        )));
                    }
                    ty.attributes.push(attribute);
                }
                other => return Err(unsupported(format!("<{other}> in <complexType>"))),
            }
        }
        Ok(ty)
    }

    fn sequence(&mut self, node: &'a XmlNode) -> Result<Vec<Particle>, SchemaError> {
        for key in ["minOccurs", "maxOccurs"] {
            if node.attribute(key).is_some_and(|v| v.trim() != "1") {
                return Err(unsupported("occurrence constraints on <sequence>"));
            }
        }
        let mut particles = Vec::new();
        for child in &node.children {
            match child.name.as_str() {
                "annotation" => {}
                "element" => particles.push(self.particle(child)?),
                other => return Err(unsupported(format!("<{other}> in <sequence>"))),
            }
        }
        Ok(particles)
    }

    fn particle(&mut self, node: &'a XmlNode) -> Result<Particle, SchemaError> {
        let (min_occurs, max_occurs) = occurs(node)?;
        let element = match (node.attribute("ref"), node.attribute("name")) {
            (Some(_), Some(_)) => {
                return Err(invalid("<element> has both 'name' and 'ref'"));
            }
            (Some(reference), None) => {
                let reference = reference.trim();
                if reference.contains(':') {
                    return Err(unsupported(format!(
                        "qualified element reference '{reference}'"
                    )));
                }
                if !self.elements.contains_key(reference) {
                    return Err(invalid(format!(
                        "reference to undeclared element '{reference}'"
                    )));
                }
                ParticleElement::Ref(reference.to_string())
            }
            (None, _) => ParticleElement::Local {
                name: required_attribute(node, "name")?.to_string(),
                decl: self.element_decl(node)?,
            },
        };
        Ok(Particle {
            element,
            min_occurs,
            max_occurs,
        })
    }

    fn attribute_decl(&mut self, node: &'a XmlNode) -> Result<AttributeDecl, SchemaError> {
        for key in ["ref", "fixed"] {
            if node.attribute(key).is_some() {
                return Err(unsupported(format!("'{key}' on <attribute>")));
            }
        }
        let name = required_attribute(node, "name")?;

        let mut inline = None;
        for child in &node.children {
            match child.name.as_str() {
                "annotation" => {}
                "simpleType" => {
                    if inline.replace(self.simple_type(child)?).is_some() {
                        return Err(invalid(format!(
                            "attribute '{name}' has more than one inline type"
                        )));
                    }
                }
                other => return Err(unsupported(format!("<{other}> inside <attribute>"))),
            }
        }

        let ty = match (node.attribute("type"), inline) {
            (Some(_), Some(_)) => {
                return Err(invalid(format!(
                    "attribute '{name}' has both a type attribute and an inline type"
                )));
            }
            (Some(qname), None) => match self.type_reference(qname)? {
                Content::Simple(ty) => ty,
                _ => return Err(invalid(format!("attribute '{name}' needs a simple type"))),
            },
            (None, Some(ty)) => ty,
            (None, None) => SimpleType::builtin(Builtin::String),
        };
        let required = match node.attribute("use").map(str::trim) {
            None | Some("optional") => false,
            Some("required") => true,
            Some("prohibited") => return Err(unsupported("prohibited attributes")),
            Some(other) => {
                return Err(invalid(format!("attribute '{name}' has use=\"{other}\"")));
            }
        };
        Ok(AttributeDecl {
            name: name.to_string(),
            ty,
            required,
        })
    }

    fn named_simple(&mut self, name: &str) -> Result<SimpleType, SchemaError> {
        if let Some(ty) = self.compiled_simple.get(name) {
            return Ok(ty.clone());
        }
        if self.resolving.iter().any(|pending| pending == name) {
            return Err(invalid(format!("simple type '{name}' derives from itself")));
        }
        let node = self
            .simple_types
            .get(name)
            .copied()
            .ok_or_else(|| invalid(format!("unknown type '{name}'")))?;

        self.resolving.push(name.to_string());
        let result = self.simple_type(node);
        self.resolving.pop();

        let ty = result?;
        self.compiled_simple.insert(name.to_string(), ty.clone());
        Ok(ty)
    }

    fn simple_type(&mut self, node: &'a XmlNode) -> Result<SimpleType, SchemaError> {
        let mut restriction = None;
        for child in &node.children {
            match child.name.as_str() {
                "annotation" => {}
                "restriction" => {
                    if restriction.replace(child).is_some() {
                        return Err(invalid("<simpleType> has more than one <restriction>"));
                    }
                }
                other => return Err(unsupported(format!("<{other}> in <simpleType>"))),
            }
        }
        let restriction =
            restriction.ok_or_else(|| invalid("<simpleType> without <restriction>"))?;
        let base = restriction
            .attribute("base")
            .ok_or_else(|| unsupported("<restriction> without a 'base' attribute"))?;

        let mut ty = match self.resolve_qname(base.trim())? {
            TypeName::Builtin(local) => Builtin::from_name(local)
                .map(SimpleType::builtin)
                .ok_or_else(|| unsupported(format!("built-in type '{local}'")))?,
            TypeName::User(local) if self.complex_types.contains_key(local) => {
                return Err(invalid(format!(
                    "simple type restricts complex type '{local}'"
                )));
            }
            TypeName::User(local) => self.named_simple(local)?,
        };
        let facets = facets(restriction, ty.builtin)?;
        ty.layers.push(facets);
        Ok(ty)
    }
}

fn facets(restriction: &XmlNode, builtin: Builtin) -> Result<Facets, SchemaError> {
    let mut facets = Facets::default();
    for child in &restriction.children {
        let facet = child.name.as_str();
        if facet == "annotation" {
            continue;
        }
        let value = child
            .attribute("value")
            .ok_or_else(|| invalid(format!("<{facet}> facet without a value")))?;
        match facet {
            "pattern" => facets.patterns.push(Pattern::compile(value)?),
            "enumeration" => facets.enumeration.push(builtin.normalize(value)),
            "length" => facets.length = Some(count_value(facet, value)?),
            "minLength" => facets.min_length = Some(count_value(facet, value)?),
            "maxLength" => facets.max_length = Some(count_value(facet, value)?),
            "totalDigits" | "fractionDigits" => {
                if !builtin.is_decimal() {
                    return Err(invalid(format!(
                        "<{facet}> does not apply to {}",
                        builtin.name()
                    )));
                }
                let count = Some(count_value(facet, value)?);
                if facet == "totalDigits" {
                    facets.total_digits = count;
                } else {
                    facets.fraction_digits = count;
                }
            }
            "minInclusive" | "maxInclusive" => {
                if !builtin.is_ordered() {
                    return Err(invalid(format!(
                        "<{facet}> does not apply to {}",
                        builtin.name()
                    )));
                }
                let bound = builtin.normalize(value);
                if compare(builtin, &bound, &bound).is_none() {
                    return Err(invalid(format!(
                        "<{facet}> value '{value}' is not a valid {}",
                        builtin.name()
                    )));
                }
                if facet == "minInclusive" {
                    facets.min_inclusive = Some(bound);
                } else {
                    facets.max_inclusive = Some(bound);
                }
            }
            other => return Err(unsupported(format!("<{other}> facet"))),
        }
    }
    Ok(facets)
}

fn occurs(node: &XmlNode) -> Result<(u32, Option<u32>), SchemaError> {
    let min = match node.attribute("minOccurs") {
        None => 1,
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| invalid(format!("minOccurs '{value}' is not a count")))?,
    };
    let max = match node.attribute("maxOccurs").map(str::trim) {
        None => Some(1),
        Some("unbounded") => None,
        Some(value) => Some(
            value
                .parse()
                .map_err(|_| invalid(format!("maxOccurs '{value}' is not a count")))?,
        ),
    };
    if let Some(max) = max
        && min > max
    {
        return Err(invalid(format!("minOccurs {min} exceeds maxOccurs {max}")));
    }
    Ok((min, max))
}

fn count_value(facet: &str, value: &str) -> Result<usize, SchemaError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("<{facet}> value '{value}' is not a count")))
}

fn required_attribute<'n>(node: &'n XmlNode, key: &str) -> Result<&'n str, SchemaError> {
    node.attribute(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| invalid(format!("<{}> without '{key}'", node.name)))
}

fn invalid(message: impl Into<String>) -> SchemaError {
    SchemaError::Invalid(message.into())
}

fn unsupported(message: impl Into<String>) -> SchemaError {
    SchemaError::Unsupported(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">"#;

    fn schema(body: &str) -> XmlSchema {
        XmlSchema::parse(format!("{HEADER}{body}</xs:schema>").as_bytes()).unwrap()
    }

    fn schema_error(body: &str) -> SchemaError {
        XmlSchema::parse(format!("{HEADER}{body}</xs:schema>").as_bytes()).unwrap_err()
    }

    fn messages(schema: &XmlSchema, document: &str) -> Vec<String> {
        schema
            .validate(document.as_bytes())
            .into_iter()
            .map(|v| v.to_string())
            .collect()
    }

    #[test]
    fn test_builtin_lexical_spaces() {
        assert!(Builtin::Date.accepts("2024-02-29"));
        assert!(Builtin::Date.accepts("2024-01-01Z"));
        assert!(Builtin::Date.accepts("2024-01-01+05:30"));
        assert!(!Builtin::Date.accepts("2023-02-29"));
        assert!(!Builtin::Date.accepts("0000-01-01"));
        assert!(!Builtin::Date.accepts("2024-1-01"));
        assert!(Builtin::Decimal.accepts("-1000.00"));
        assert!(Builtin::Decimal.accepts(".5"));
        assert!(!Builtin::Decimal.accepts("1e3"));
        assert!(Builtin::NonNegativeInteger.accepts("-0"));
        assert!(!Builtin::NonNegativeInteger.accepts("-1"));
        assert!(!Builtin::PositiveInteger.accepts("000"));
        assert!(Builtin::PositiveInteger.accepts("+007"));
        assert!(Builtin::Boolean.accepts("1"));
        assert!(!Builtin::Boolean.accepts("yes"));
    }

    #[test]
    fn test_whitespace_facets() {
        assert_eq!(Builtin::String.normalize(" a\tb "), " a\tb ");
        assert_eq!(Builtin::NormalizedString.normalize(" a\tb "), " a b ");
        assert_eq!(Builtin::Token.normalize("  a \n  b "), "a b");
    }

    #[test]
    fn test_digit_counts() {
        assert_eq!(digit_counts("100.50"), (4, 1));
        assert_eq!(digit_counts("-0.00"), (1, 0));
        assert_eq!(digit_counts("007"), (1, 0));
        assert_eq!(digit_counts("12.345"), (5, 3));
    }

    #[test]
    fn test_sequence_occurrences() {
        let schema = schema(
            r#"<xs:element name="List">
                 <xs:complexType><xs:sequence>
                   <xs:element name="Head" type="xs:string"/>
                   <xs:element name="Item" type="xs:integer" minOccurs="0" maxOccurs="2"/>
                 </xs:sequence></xs:complexType>
               </xs:element>"#,
        );
        assert!(messages(&schema, "<List><Head/><Item>1</Item></List>").is_empty());
        assert_eq!(
            messages(&schema, "<List><Item>1</Item></List>"),
            vec!["/List: missing required element <Head>"]
        );
        assert_eq!(
            messages(&schema, "<List><Head/><Item>1</Item><Item>2</Item><Item>3</Item></List>"),
            vec!["/List: unexpected element <Item>"]
        );
        assert_eq!(
            messages(&schema, "<List><Head/><Item>x</Item></List>"),
            vec!["/List/Item[1]: 'x' is not a valid integer"]
        );
    }

    #[test]
    fn test_named_types_and_refs() {
        let schema = schema(
            r#"<xs:element name="Tree" type="NodeType"/>
               <xs:element name="Label" type="LabelType"/>
               <xs:complexType name="NodeType">
                 <xs:sequence>
                   <xs:element ref="Label"/>
                   <xs:element name="Node" type="NodeType" minOccurs="0" maxOccurs="unbounded"/>
                 </xs:sequence>
               </xs:complexType>
               <xs:simpleType name="LabelType">
                 <xs:restriction base="ShortText"><xs:pattern value="[a-z]+"/></xs:restriction>
               </xs:simpleType>
               <xs:simpleType name="ShortText">
                 <xs:restriction base="xs:token"><xs:maxLength value="5"/></xs:restriction>
               </xs:simpleType>"#,
        );
        assert!(schema.declares("Tree"));
        let document = "<Tree><Label>root</Label><Node><Label>leaf</Label></Node></Tree>";
        assert!(messages(&schema, document).is_empty());
        assert_eq!(
            messages(&schema, "<Tree><Label>Toolong</Label></Tree>"),
            vec![
                "/Tree/Label[1]: length 7 exceeds maxLength 5",
                "/Tree/Label[1]: 'Toolong' does not match pattern '[a-z]+'"
            ]
        );
    }

    #[test]
    fn test_value_facets() {
        let schema = schema(
            r#"<xs:element name="Row">
                 <xs:complexType><xs:sequence>
                   <xs:element name="Kind">
                     <xs:simpleType><xs:restriction base="xs:string">
                       <xs:enumeration value="debit"/><xs:enumeration value="credit"/>
                     </xs:restriction></xs:simpleType>
                   </xs:element>
                   <xs:element name="Price">
                     <xs:simpleType><xs:restriction base="xs:decimal">
                       <xs:totalDigits value="5"/><xs:fractionDigits value="2"/>
                       <xs:minInclusive value="0"/><xs:maxInclusive value="999.99"/>
                     </xs:restriction></xs:simpleType>
                   </xs:element>
                   <xs:element name="Day">
                     <xs:simpleType><xs:restriction base="xs:date">
                       <xs:minInclusive value="2024-01-01"/>
                     </xs:restriction></xs:simpleType>
                   </xs:element>
                   <xs:element name="Code">
                     <xs:simpleType><xs:restriction base="xs:string">
                       <xs:length value="3"/>
                     </xs:restriction></xs:simpleType>
                   </xs:element>
                 </xs:sequence></xs:complexType>
               </xs:element>"#,
        );
        let ok = "<Row><Kind>debit</Kind><Price>12.50</Price><Day>2024-03-01</Day><Code>abc</Code></Row>";
        assert!(messages(&schema, ok).is_empty());
        let bad = "<Row><Kind>other</Kind><Price>1000.005</Price><Day>2023-12-31</Day><Code>ab</Code></Row>";
        assert_eq!(
            messages(&schema, bad),
            vec![
                "/Row/Kind[1]: 'other' is not one of [debit, credit]",
                "/Row/Price[1]: '1000.005' has 7 digits, totalDigits is 5",
                "/Row/Price[1]: '1000.005' has 3 fraction digits, fractionDigits is 2",
                "/Row/Price[1]: '1000.005' is above maxInclusive 999.99",
                "/Row/Day[1]: '2023-12-31' is below minInclusive 2024-01-01",
                "/Row/Code[1]: length 2 differs from required length 3",
            ]
        );
    }

    #[test]
    fn test_attributes() {
        let schema = schema(
            r#"<xs:element name="Doc">
                 <xs:complexType>
                   <xs:attribute name="version" type="xs:positiveInteger" use="required"/>
                   <xs:attribute name="lang" type="xs:token"/>
                 </xs:complexType>
               </xs:element>"#,
        );
        assert!(messages(&schema, r#"<Doc version="2" lang="en"/>"#).is_empty());
        assert!(
            messages(
                &schema,
                r#"<Doc xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="s.xsd" version="1"/>"#
            )
            .is_empty()
        );
        assert_eq!(
            messages(&schema, r#"<Doc version="0" extra="x"/>"#),
            vec![
                "/Doc: attribute 'version': '0' is not a valid positiveInteger",
                "/Doc: attribute 'extra' is not declared"
            ]
        );
        assert_eq!(
            messages(&schema, "<Doc/>"),
            vec!["/Doc: missing required attribute 'version'"]
        );
    }

    #[test]
    fn test_content_kinds() {
        let schema = schema(
            r#"<xs:element name="Box">
                 <xs:complexType><xs:sequence>
                   <xs:element name="Leaf" type="xs:string"/>
                   <xs:element name="Free" minOccurs="0"/>
                 </xs:sequence></xs:complexType>
               </xs:element>"#,
        );
        assert!(messages(&schema, "<Box><Leaf>x</Leaf><Free><Any a=\"1\">t</Any></Free></Box>").is_empty());
        assert_eq!(
            messages(&schema, "<Box>stray<Leaf><b/></Leaf></Box>"),
            vec![
                "/Box: character data not allowed in element-only content",
                "/Box/Leaf[1]: element <b> not allowed in simple content"
            ]
        );
        assert_eq!(
            messages(&schema, "<Other/>"),
            vec!["/Other: no global declaration for element <Other>"]
        );
        let broken = schema.validate(b"<Box><Leaf></Box>");
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].path, "/");
    }

    #[test]
    fn test_unsupported_constructs_are_fatal() {
        for body in [
            r#"<xs:element name="A"><xs:complexType><xs:choice/></xs:complexType></xs:element>"#,
            r#"<xs:element name="A"><xs:simpleType><xs:list itemType="xs:string"/></xs:simpleType></xs:element>"#,
            r#"<xs:element name="A" type="xs:dateTime"/>"#,
            r#"<xs:element name="A" type="T"/><xs:simpleType name="T"><xs:restriction base="xs:string"><xs:whiteSpace value="collapse"/></xs:restriction></xs:simpleType>"#,
            r#"<xs:import namespace="urn:x"/><xs:element name="A"/>"#,
        ] {
            assert!(
                matches!(schema_error(body), SchemaError::Unsupported(_)),
                "{body}"
            );
        }
    }

    #[test]
    fn test_invalid_schemas() {
        for body in [
            "",
            r#"<xs:element name="A" type="Missing"/>"#,
            r#"<xs:element name="A"><xs:complexType><xs:sequence><xs:element ref="B"/></xs:sequence></xs:complexType></xs:element>"#,
            r#"<xs:element name="A" type="T"/><xs:simpleType name="T"><xs:restriction base="T"/></xs:simpleType>"#,
            r#"<xs:element name="A"><xs:complexType><xs:sequence><xs:element name="B" minOccurs="2" maxOccurs="1"/></xs:sequence></xs:complexType></xs:element>"#,
            r#"<xs:element name="A" type="T"/><xs:simpleType name="T"><xs:restriction base="xs:string"><xs:minInclusive value="a"/></xs:restriction></xs:simpleType>"#,
        ] {
            assert!(matches!(schema_error(body), SchemaError::Invalid(_)), "{body}");
        }
        assert!(matches!(
            XmlSchema::parse(b"<schema/>").unwrap_err(),
            SchemaError::Invalid(_)
        ));
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let err = schema_error(
            r#"<xs:element name="A" type="T"/><xs:simpleType name="T"><xs:restriction base="xs:string"><xs:pattern value="(unclosed"/></xs:restriction></xs:simpleType>"#,
        );
        assert!(matches!(err, SchemaError::Pattern { .. }));
    }
}
