/// Builds an [`Object`](crate::Object) from `"path" => value` pairs.
///
/// A value is `null` (a tombstone) or a single token whose `to_string()` is
/// stored: a literal, a variable, or a parenthesized expression.
///
/// ```rust
/// use serde_bit::bit;
///
/// let port = 8080;
/// let obj = bit! {
///     "server.host" => "localhost",
///     "server.port" => port,
///     "server.workers" => (2 * 4),
///     "server.debug" => null,
/// };
/// assert_eq!(obj.at("server.port").value().as_deref(), Some("8080"));
/// assert_eq!(obj.at("server.workers").value().as_deref(), Some("8"));
/// assert_eq!(obj.at("server.debug").entry(), Some(None));
/// ```
#[macro_export]
macro_rules! bit {
    (@assign $object:ident, $path:expr, null) => {
        $object.at($path).assign(::core::option::Option::None)
    };

    (@assign $object:ident, $path:expr, $value:tt) => {
        $object
            .at($path)
            .set(::std::string::ToString::to_string(&$value))
    };

    () => {
        $crate::Object::new()
    };

    ($($path:literal => $value:tt),+ $(,)?) => {{
        let object = $crate::Object::new();
        $(
            $crate::bit!(@assign object, $path, $value);
        )+
        object
    }};
}
