use dom_watch::{
	diff::{diff, ChangeRecord},
	memory::MemoryNode,
	snapshot::snapshot,
};

fn element(tag: &str) -> MemoryNode {
	MemoryNode::element(tag)
}

fn diff_now(root: &MemoryNode, before: &dom_watch::snapshot::ElementStructure<MemoryNode>) -> (bool, Vec<ChangeRecord<MemoryNode>>) {
	let mut records = Vec::new();
	let dirty = diff(&mut records, root, before);
	(dirty, records)
}

#[test]
fn unchanged_tree_is_clean() {
	let root = element("div").with_children(vec![
		element("header").with_id("top").with_children(vec![MemoryNode::text("Hello"), element("em")]),
		MemoryNode::comment("separator"),
		element("ul").with_children(vec![element("li"), element("li"), element("li")]),
	]);
	let before = snapshot(&root);

	let (dirty, records) = diff_now(&root, &before);
	assert!(!dirty);
	assert!(records.is_empty());
}

#[test]
fn empty_root_is_clean() {
	let root = element("div");
	let (dirty, records) = diff_now(&root, &snapshot(&root));
	assert!(!dirty);
	assert!(records.is_empty());
}

#[test]
fn append() {
	let (a, b, c) = (element("a"), element("b"), element("c"));
	let root = element("div").with_children(vec![a, b]);
	let before = snapshot(&root);

	root.append_child(&c);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records, [ChangeRecord::added(c)]);
}

#[test]
fn remove_middle() {
	let (a, b, c) = (element("a"), element("b"), element("c"));
	let root = element("div").with_children(vec![a, b.clone(), c]);
	let before = snapshot(&root);

	root.remove_child(&b);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records, [ChangeRecord::removed(b)]);
}

#[test]
fn swap_is_dirty_without_records() {
	let (a, b) = (element("a"), element("b"));
	let root = element("div").with_children(vec![a.clone(), b]);
	let before = snapshot(&root);

	root.append_child(&a);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert!(records.is_empty());
}

#[test]
fn rotation_is_dirty_without_records() {
	let (a, b, c) = (element("a"), element("b"), element("c"));
	let root = element("div").with_children(vec![a, b, c.clone()]);
	let before = snapshot(&root);

	root.insert_before(&c, root.children().first());

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert!(records.is_empty());
}

#[test]
fn child_changes() {
	let span1 = element("span").with_children(vec![element("em")]);
	let span2 = element("span");
	let foo = element("div").with_id("foo").with_children(vec![span1.clone(), span2.clone()]);
	let root = element("div").with_children(vec![foo.clone()]);
	let before = snapshot(&root);

	let span3 = element("span").with_children(vec![element("strong")]);
	foo.replace_children(vec![span3.clone()]);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records.len(), 3);
	assert!(records.contains(&ChangeRecord::added(span3)));
	assert!(records.contains(&ChangeRecord::removed(span1)));
	assert!(records.contains(&ChangeRecord::removed(span2)));
}

#[test]
fn nested_persisting_sibling_is_not_reported() {
	let span1 = element("span");
	let span2 = element("span");
	let foo = element("div").with_children(vec![span1.clone(), span2]);
	let root = element("div").with_children(vec![foo.clone()]);
	let before = snapshot(&root);

	let span3 = element("span");
	foo.remove_child(&span1);
	foo.append_child(&span3);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records, [ChangeRecord::removed(span1), ChangeRecord::added(span3)]);
}

#[test]
fn replaced_in_place_is_one_removal_and_one_addition() {
	let (a, b, x) = (element("a"), element("b"), element("x"));
	let root = element("div").with_children(vec![a, b.clone()]);
	let before = snapshot(&root);

	root.insert_before(&x, Some(&b));
	root.remove_child(&b);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records, [ChangeRecord::added(x), ChangeRecord::removed(b)]);
}

#[test]
fn changes_inside_moved_node_are_found() {
	let x = element("x");
	let a = element("a").with_children(vec![x]);
	let b = element("b");
	let root = element("div").with_children(vec![a.clone(), b]);
	let before = snapshot(&root);

	root.append_child(&a);
	let y = element("y");
	a.append_child(&y);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records, [ChangeRecord::added(y)]);
}

#[test]
fn move_to_front_with_removals() {
	let (a, b, c) = (element("a"), element("b"), element("c"));
	let root = element("div").with_children(vec![a.clone(), b.clone(), c]);
	let before = snapshot(&root);

	root.remove_child(&a);
	root.remove_child(&b);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records, [ChangeRecord::removed(a), ChangeRecord::removed(b)]);
}

#[test]
fn moves_between_parents_are_reported_at_both_ends() {
	let item = element("li");
	let first = element("ul").with_children(vec![item.clone()]);
	let second = element("ol");
	let root = element("div").with_children(vec![first, second.clone()]);
	let before = snapshot(&root);

	second.append_child(&item);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records, [ChangeRecord::removed(item.clone()), ChangeRecord::added(item)]);
}

#[test]
fn descendants_of_added_nodes_are_implied() {
	let root = element("div");
	let before = snapshot(&root);

	let section = element("section").with_children(vec![element("p"), element("p")]);
	root.append_child(&section);

	let (_, records) = diff_now(&root, &before);
	assert_eq!(records, [ChangeRecord::added(section)]);
}

#[test]
fn text_and_comment_nodes_are_tracked() {
	let text = MemoryNode::text("hello");
	let root = element("p").with_children(vec![text.clone()]);
	let before = snapshot(&root);

	let comment = MemoryNode::comment("note");
	root.remove_child(&text);
	root.append_child(&comment);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records, [ChangeRecord::added(comment), ChangeRecord::removed(text)]);
}

#[test]
fn snapshot_only_descends_into_elements() {
	let root = element("div").with_children(vec![MemoryNode::text("a"), element("p").with_children(vec![MemoryNode::text("b")])]);
	let structure = snapshot(&root);

	assert_eq!(structure.node_count(), 4);
	assert!(!structure.is_leaf());
	assert!(structure.children()[0].is_leaf());
	assert_eq!(structure.children()[1].children().len(), 1);
}

#[test]
fn replacement_sharing_an_id_is_reported_at_both_ends() {
	let old = element("div").with_id("panel");
	let root = element("main").with_children(vec![old.clone()]);
	let before = snapshot(&root);

	let new = element("div").with_id("panel");
	root.replace_children(vec![new.clone()]);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records, [ChangeRecord::added(new), ChangeRecord::removed(old)]);
}

#[test]
fn replacement_sharing_an_id_next_to_a_move() {
	let (a, b) = (element("a"), element("b"));
	let old = element("div").with_id("panel");
	let root = element("main").with_children(vec![a.clone(), old.clone(), b.clone()]);
	let before = snapshot(&root);

	let new = element("div").with_id("panel");
	root.replace_children(vec![b, new.clone(), a]);

	let (dirty, records) = diff_now(&root, &before);
	assert!(dirty);
	assert_eq!(records.len(), 2);
	assert!(records.contains(&ChangeRecord::added(new)));
	assert!(records.contains(&ChangeRecord::removed(old)));
}
