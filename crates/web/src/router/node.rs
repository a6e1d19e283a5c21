use crate::router::pattern::Segment;

/// A registered pattern, stored on the trie node where it ends.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    pub(crate) pattern: String,
    pub(crate) segments: Vec<Segment>,
}

/// One segment position of a per-method prefix tree.
#[derive(Debug)]
pub(crate) struct Node {
    segment: Segment,
    route: Option<Route>,
    children: Vec<Node>,
}

impl Node {
    pub(crate) fn root() -> Self {
        Self::new(Segment::Literal(String::new()))
    }

    fn new(segment: Segment) -> Self {
        Self { segment, route: None, children: Vec::new() }
    }

    pub(crate) fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    fn child_mut(&mut self, segment: &Segment) -> Option<&mut Node> {
        self.children.iter_mut().find(|child| child.segment.same_slot(segment))
    }

    fn child(&self, segment: &Segment) -> Option<&Node> {
        self.children.iter().find(|child| child.segment.same_slot(segment))
    }

    /// Inserts `pattern` below this node, creating missing children in order.
    ///
    /// The node reached after the last part becomes terminal. A route already
    /// stored there is replaced.
    pub(crate) fn insert(&mut self, pattern: &str, parts: &[Segment], depth: usize) {
        let Some(part) = parts.get(depth) else {
            self.route = Some(Route { pattern: pattern.to_string(), segments: parts.to_vec() });
            return;
        };

        if self.child_mut(part).is_none() {
            self.children.push(Node::new(part.clone()));
        }

        if let Some(child) = self.child_mut(part) {
            child.insert(pattern, parts, depth + 1);
        }
    }

    /// The pattern already stored at the node `parts` would be inserted into, if any.
    pub(crate) fn terminal(&self, parts: &[Segment], depth: usize) -> Option<&str> {
        match parts.get(depth) {
            None => self.route.as_ref().map(|route| route.pattern.as_str()),
            Some(part) => self.child(part)?.terminal(parts, depth + 1),
        }
    }

    /// Depth-first search for the terminal node matching the request path `parts`.
    ///
    /// Children are tried in insertion order and the first successful branch wins,
    /// so a failed literal branch falls back to a wild sibling and vice versa.
    pub(crate) fn search(&self, parts: &[&str], depth: usize) -> Option<&Node> {
        if depth == parts.len() || self.segment.is_wildcard() {
            return self.route.is_some().then_some(self);
        }

        let part = parts[depth];
        self.children
            .iter()
            .filter(|child| child.segment.matches(part))
            .find_map(|child| child.search(parts, depth + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::Node;
    use crate::router::pattern::{parse_pattern, split_segments};

    fn tree(patterns: &[&str]) -> Node {
        let mut root = Node::root();
        for pattern in patterns {
            root.insert(pattern, &parse_pattern(pattern), 0);
        }
        root
    }

    fn search<'a>(root: &'a Node, path: &str) -> Option<&'a str> {
        root.search(&split_segments(path), 0).and_then(|node| node.route()).map(|route| route.pattern.as_str())
    }

    #[test]
    fn test_static_and_param() {
        let root = tree(&["/", "/hello", "/hello/:name", "/hello/b/c", "/hi/:name", "/assets/*filepath"]);

        assert_eq!(search(&root, "/"), Some("/"));
        assert_eq!(search(&root, "/hello"), Some("/hello"));
        assert_eq!(search(&root, "/hello/geektutu"), Some("/hello/:name"));
        assert_eq!(search(&root, "/hello/b/c"), Some("/hello/b/c"));
        assert_eq!(search(&root, "/hi/geek"), Some("/hi/:name"));
        assert_eq!(search(&root, "/assets/css/a.css"), Some("/assets/*filepath"));
    }

    #[test]
    fn test_intermediate_node_is_not_a_match() {
        let root = tree(&["/hello/b/c"]);

        assert_eq!(search(&root, "/hello"), None);
        assert_eq!(search(&root, "/hello/b"), None);
        assert_eq!(search(&root, "/"), None);
    }

    #[test]
    fn test_wildcard_needs_a_segment() {
        let root = tree(&["/assets/*filepath"]);

        assert_eq!(search(&root, "/assets"), None);
        assert_eq!(search(&root, "/assets/"), None);
        assert_eq!(search(&root, "/assets/a"), Some("/assets/*filepath"));
    }

    #[test]
    fn test_backtracks_from_literal_to_param() {
        // "/p/go" is a dead end for "/p/go/doc", the param branch must be tried next
        let root = tree(&["/p/go/x", "/p/:lang/doc"]);

        assert_eq!(search(&root, "/p/go/doc"), Some("/p/:lang/doc"));
        assert_eq!(search(&root, "/p/go/x"), Some("/p/go/x"));
    }

    #[test]
    fn test_first_registered_branch_wins() {
        let root = tree(&["/p/:lang", "/p/go"]);
        assert_eq!(search(&root, "/p/go"), Some("/p/:lang"));

        let root = tree(&["/p/go", "/p/:lang"]);
        assert_eq!(search(&root, "/p/go"), Some("/p/go"));
    }

    #[test]
    fn test_params_share_a_slot() {
        let root = tree(&["/user/:id/profile", "/user/:name/posts"]);

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(search(&root, "/user/7/posts"), Some("/user/:name/posts"));
    }

    #[test]
    fn test_terminal_lookup() {
        let root = tree(&["/user/:id", "/files/*path"]);

        assert_eq!(root.terminal(&parse_pattern("/user/:name"), 0), Some("/user/:id"));
        assert_eq!(root.terminal(&parse_pattern("/files/*"), 0), Some("/files/*path"));
        assert_eq!(root.terminal(&parse_pattern("/user"), 0), None);
        assert_eq!(root.terminal(&parse_pattern("/other"), 0), None);
    }

    #[test]
    fn test_reinsert_replaces_route() {
        let root = tree(&["/user/:id", "/user/:name"]);
        assert_eq!(search(&root, "/user/1"), Some("/user/:name"));
    }
}
