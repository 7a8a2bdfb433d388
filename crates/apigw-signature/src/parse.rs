use crate::descriptor::{
    BaseType, ClassDescriptor, ClassSignature, MethodSignature, TypeDescriptor,
    TypeParameterDescriptor,
};
use crate::error::{Result, SignatureError};

/// Parse a `JavaTypeSignature`: a base type or any reference type signature.
pub fn parse_type_signature(sig: &str) -> Result<TypeDescriptor> {
    let (ty, rest) = parse_java_type(sig, sig)?;
    expect_end(sig, rest)?;
    Ok(ty)
}

/// Parse a field signature, which must be a reference type.
pub fn parse_field_signature(sig: &str) -> Result<TypeDescriptor> {
    let (ty, rest) = parse_reference_type(sig, sig)?;
    expect_end(sig, rest)?;
    Ok(ty)
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    let (type_parameters, rest) = parse_type_parameters(sig, sig)?;
    let (super_class, mut rest) = parse_class_type(sig, rest)?;

    let mut interfaces = Vec::new();
    while !rest.is_empty() {
        let (iface, next) = parse_class_type(sig, rest)?;
        interfaces.push(iface);
        rest = next;
    }

    Ok(ClassSignature {
        type_parameters,
        super_class,
        interfaces,
    })
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    let (type_parameters, rest) = parse_type_parameters(sig, sig)?;
    let mut rest = rest
        .strip_prefix('(')
        .ok_or_else(|| SignatureError::invalid(sig, "expected `(`"))?;

    let mut parameters = Vec::new();
    loop {
        if let Some(next) = rest.strip_prefix(')') {
            rest = next;
            break;
        }
        if rest.is_empty() {
            return Err(SignatureError::invalid(sig, "unterminated parameter list"));
        }
        let (param, next) = parse_java_type(sig, rest)?;
        parameters.push(param);
        rest = next;
    }

    let (return_type, mut rest) = match rest.strip_prefix('V') {
        Some(next) => (None, next),
        None => {
            let (ty, next) = parse_java_type(sig, rest)?;
            (Some(ty), next)
        }
    };

    // Throws clauses carry no information the type algebra uses.
    while let Some(next) = rest.strip_prefix('^') {
        let (_, next) = parse_reference_type(sig, next)?;
        rest = next;
    }
    expect_end(sig, rest)?;

    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
    })
}

fn expect_end(sig: &str, rest: &str) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(SignatureError::invalid(sig, "trailing characters"))
    }
}

fn parse_java_type<'a>(sig: &str, input: &'a str) -> Result<(TypeDescriptor, &'a str)> {
    let Some(first) = input.chars().next() else {
        return Err(SignatureError::invalid(sig, "unexpected end of signature"));
    };
    if let Some(base) = BaseType::from_descriptor_char(first) {
        return Ok((TypeDescriptor::Base(base), &input[1..]));
    }
    parse_reference_type(sig, input)
}

fn parse_reference_type<'a>(sig: &str, input: &'a str) -> Result<(TypeDescriptor, &'a str)> {
    match input.chars().next() {
        Some('L') => {
            let (class, rest) = parse_class_type(sig, input)?;
            Ok((TypeDescriptor::Class(class), rest))
        }
        Some('T') => {
            let (name, rest) = parse_identifier(sig, &input[1..])?;
            let rest = rest
                .strip_prefix(';')
                .ok_or_else(|| SignatureError::invalid(sig, "expected `;` after type variable"))?;
            Ok((TypeDescriptor::Variable(name.to_string()), rest))
        }
        Some('[') => {
            let (component, rest) = parse_java_type(sig, &input[1..])?;
            Ok((TypeDescriptor::Array(Box::new(component)), rest))
        }
        Some(_) => Err(SignatureError::invalid(sig, "unknown type tag")),
        None => Err(SignatureError::invalid(sig, "unexpected end of signature")),
    }
}

fn parse_class_type<'a>(sig: &str, input: &'a str) -> Result<(ClassDescriptor, &'a str)> {
    let rest = input
        .strip_prefix('L')
        .ok_or_else(|| SignatureError::invalid(sig, "expected class type"))?;

    // The first segment includes the package specifier (`java/util/Map`).
    let end = rest
        .find(['<', '.', ';'])
        .ok_or_else(|| SignatureError::invalid(sig, "unterminated class type"))?;
    if end == 0 {
        return Err(SignatureError::invalid(sig, "empty class name"));
    }
    let name = rest[..end].replace('/', ".");
    let (args, mut rest) = parse_optional_type_arguments(sig, &rest[end..])?;
    let mut class = ClassDescriptor::new(name, args);

    while let Some(next) = rest.strip_prefix('.') {
        let (simple, next) = parse_identifier(sig, next)?;
        let (args, next) = parse_optional_type_arguments(sig, next)?;
        class = ClassDescriptor::nested(class, simple, args);
        rest = next;
    }

    let rest = rest
        .strip_prefix(';')
        .ok_or_else(|| SignatureError::invalid(sig, "expected `;` after class type"))?;
    Ok((class, rest))
}

fn parse_optional_type_arguments<'a>(
    sig: &str,
    input: &'a str,
) -> Result<(Vec<TypeDescriptor>, &'a str)> {
    let Some(mut rest) = input.strip_prefix('<') else {
        return Ok((Vec::new(), input));
    };

    let mut args = Vec::new();
    loop {
        if let Some(next) = rest.strip_prefix('>') {
            if args.is_empty() {
                return Err(SignatureError::invalid(sig, "empty type argument list"));
            }
            return Ok((args, next));
        }
        let (arg, next) = match rest.chars().next() {
            Some('*') => (TypeDescriptor::unbounded_wildcard(), &rest[1..]),
            Some('+') => {
                let (upper, next) = parse_reference_type(sig, &rest[1..])?;
                (TypeDescriptor::extends(upper), next)
            }
            Some('-') => {
                let (lower, next) = parse_reference_type(sig, &rest[1..])?;
                (TypeDescriptor::super_of(lower), next)
            }
            Some(_) => parse_reference_type(sig, rest)?,
            None => return Err(SignatureError::invalid(sig, "unterminated type argument list")),
        };
        args.push(arg);
        rest = next;
    }
}

fn parse_type_parameters<'a>(
    sig: &str,
    input: &'a str,
) -> Result<(Vec<TypeParameterDescriptor>, &'a str)> {
    let Some(mut rest) = input.strip_prefix('<') else {
        return Ok((Vec::new(), input));
    };

    let mut params = Vec::new();
    loop {
        if let Some(next) = rest.strip_prefix('>') {
            if params.is_empty() {
                return Err(SignatureError::invalid(sig, "empty type parameter list"));
            }
            return Ok((params, next));
        }

        let (name, next) = parse_identifier(sig, rest)?;
        let mut next = next
            .strip_prefix(':')
            .ok_or_else(|| SignatureError::invalid(sig, "expected class bound"))?;

        let mut bounds = Vec::new();
        // The class bound may be empty when the first bound is an interface (`T::Ljava/lang/Comparable<TT;>;`).
        if !next.starts_with(':') && !next.starts_with('>') {
            let (bound, after) = parse_reference_type(sig, next)?;
            bounds.push(bound);
            next = after;
        }
        while let Some(after_colon) = next.strip_prefix(':') {
            let (bound, after) = parse_reference_type(sig, after_colon)?;
            bounds.push(bound);
            next = after;
        }
        if bounds.is_empty() {
            bounds.push(TypeDescriptor::object());
        }

        params.push(TypeParameterDescriptor {
            name: name.to_string(),
            bounds,
        });
        rest = next;
    }
}

fn parse_identifier<'a>(sig: &str, input: &'a str) -> Result<(&'a str, &'a str)> {
    let end = input
        .find(['.', ';', '[', '/', '<', '>', ':'])
        .unwrap_or(input.len());
    if end == 0 {
        return Err(SignatureError::invalid(sig, "empty identifier"));
    }
    Ok((&input[..end], &input[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_type_signature_primitives_arrays_and_variables() {
        assert_eq!(
            parse_type_signature("I").unwrap(),
            TypeDescriptor::Base(BaseType::Int)
        );
        assert_eq!(
            parse_type_signature("[[TT;").unwrap(),
            TypeDescriptor::array(TypeDescriptor::array(TypeDescriptor::variable("T")))
        );
        assert!(parse_field_signature("I").is_err());
    }

    #[test]
    fn parse_field_signature_with_wildcards() {
        let ty = parse_field_signature("Ljava/util/Map<*+Ljava/lang/Number;-TT;>;").unwrap();
        assert_eq!(
            ty,
            TypeDescriptor::parameterized(
                "java.util.Map",
                vec![
                    TypeDescriptor::unbounded_wildcard(),
                    TypeDescriptor::extends(TypeDescriptor::class("java.lang.Number")),
                    TypeDescriptor::super_of(TypeDescriptor::variable("T")),
                ]
            )
        );
    }

    #[test]
    fn parse_inner_class_of_parameterized_owner() {
        let ty = parse_field_signature("Lcom/example/Outer<TT;>.Inner<Ljava/lang/String;>;")
            .unwrap();
        let TypeDescriptor::Class(class) = ty else {
            panic!("expected class descriptor");
        };
        assert_eq!(class.name, "com.example.Outer$Inner");
        assert_eq!(class.args, vec![TypeDescriptor::class("java.lang.String")]);
        let owner = class.owner.expect("owner should be spelled out");
        assert_eq!(owner.name, "com.example.Outer");
        assert_eq!(owner.args, vec![TypeDescriptor::variable("T")]);
    }

    #[test]
    fn parse_class_signature_with_self_referential_bound() {
        let sig = parse_class_signature(
            "<E:Ljava/lang/Enum<TE;>;>Ljava/lang/Object;Ljava/lang/Comparable<TE;>;",
        )
        .unwrap();
        assert_eq!(sig.type_parameters.len(), 1);
        assert_eq!(sig.type_parameters[0].name, "E");
        assert_eq!(
            sig.type_parameters[0].bounds,
            vec![TypeDescriptor::parameterized(
                "java.lang.Enum",
                vec![TypeDescriptor::variable("E")]
            )]
        );
        assert_eq!(sig.super_class, ClassDescriptor::new("java.lang.Object", vec![]));
        assert_eq!(sig.interfaces.len(), 1);
    }

    #[test]
    fn parse_interface_only_bound_and_defaulted_bound() {
        let sig = parse_class_signature("<T::Ljava/lang/Comparable<TT;>;U:>Ljava/lang/Object;")
            .unwrap();
        assert_eq!(
            sig.type_parameters[0].bounds,
            vec![TypeDescriptor::parameterized(
                "java.lang.Comparable",
                vec![TypeDescriptor::variable("T")]
            )]
        );
        assert_eq!(sig.type_parameters[1].bounds, vec![TypeDescriptor::object()]);
    }

    #[test]
    fn parse_method_signature_with_throws() {
        let sig = parse_method_signature(
            "<T:Ljava/lang/Object;>(Ljava/util/List<TT;>;I)TT;^Ljava/io/IOException;",
        )
        .unwrap();
        assert_eq!(sig.type_parameters.len(), 1);
        assert_eq!(sig.parameters.len(), 2);
        assert_eq!(sig.return_type, Some(TypeDescriptor::variable("T")));

        let void = parse_method_signature("()V").unwrap();
        assert!(void.parameters.is_empty());
        assert_eq!(void.return_type, None);
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        for sig in ["", "Ljava/util/List", "Ljava/util/List<>;", "Q", "TT", "[", "Ljava/lang/Object;X"] {
            assert!(parse_type_signature(sig).is_err(), "expected `{sig}` to be rejected");
        }
        assert!(parse_method_signature("I)V").is_err());
        assert!(parse_method_signature("(I").is_err());
    }
}
