/// Builds a [`VdomElement`](crate::VdomElement) from a tag name and a list of children.
///
/// Each child is converted with [`Into<VdomChild>`](crate::VdomChild), so strings, numbers,
/// elements and [`AnyComponent`](crate::AnyComponent)s can be mixed freely.
///
/// # Usage
///
/// ```rust
/// use tideline_core::vdom;
///
/// let list = vdom!("ul", [vdom!("li", ["first"]), vdom!("li", ["second"])]);
/// assert_eq!(list.child_nodes().len(), 2);
/// ```
#[macro_export]
macro_rules! vdom {
    ($tag:expr) => {
        $crate::VdomElement::new($tag)
    };
    ($tag:expr, [$($child:expr),* $(,)?]) => {
        $crate::VdomElement::new($tag)$(.child($child))*
    };
}
