use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/**
 * Typed index of an entity attached to an `EntityGraph`.
 *
 * Handles identify attached instances, transient or persisted, independently of their ids.
 */
pub struct Handle<T> {
    index: usize,
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(index: usize) -> Self {
        Handle { index, marker: PhantomData }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/**
 * One-to-many relationship where the owner holds a collection and every member holds an
 * exclusive back-reference to its owner.
 */
pub struct Ownership<O, M> {
    members: HashMap<Handle<O>, BTreeSet<Handle<M>>>,
    owners: HashMap<Handle<M>, Handle<O>>,
}

impl<O, M> Default for Ownership<O, M> {
    fn default() -> Self {
        Ownership { members: HashMap::new(), owners: HashMap::new() }
    }
}

impl<O, M> Ownership<O, M> {
    /**
     * Members currently owned by `owner`, in attach order.
     */
    pub fn members(&self, owner: Handle<O>) -> Vec<Handle<M>> {
        self.members.get(&owner).map(|members| members.iter().copied().collect()).unwrap_or_default()
    }

    /**
     * Owner referenced by `member`.
     */
    pub fn owner(&self, member: Handle<M>) -> Option<Handle<O>> {
        self.owners.get(&member).copied()
    }

    /**
     * Replaces the collection of `owner`.
     *
     * Members dropped from the collection lose their back-reference. Members of `new_members`
     * point at `owner` afterwards, leaving any previous owner's collection.
     */
    pub fn set_members(&mut self, owner: Handle<O>, new_members: impl IntoIterator<Item = Handle<M>>) {
        let new_members: BTreeSet<Handle<M>> = new_members.into_iter().collect();
        let old_members = self.members.remove(&owner).unwrap_or_default();
        for member in old_members.difference(&new_members) {
            self.owners.remove(member);
        }
        for member in &new_members {
            self.detach_from_previous_owner(*member, owner);
            self.owners.insert(*member, owner);
        }
        self.members.insert(owner, new_members);
    }

    /**
     * Adds `member` to the collection of `owner`.
     */
    pub fn add_member(&mut self, owner: Handle<O>, member: Handle<M>) {
        self.set_owner(member, Some(owner));
    }

    /**
     * Removes `member` from the collection of `owner` and clears its back-reference.
     * Does nothing when `member` belongs to another owner.
     */
    pub fn remove_member(&mut self, owner: Handle<O>, member: Handle<M>) {
        if self.owner(member) == Some(owner) {
            self.set_owner(member, None);
        }
    }

    /**
     * Sets the back-reference of `member`, moving it between owner collections.
     */
    pub fn set_owner(&mut self, member: Handle<M>, owner: Option<Handle<O>>) {
        match owner {
            Some(owner) => {
                self.detach_from_previous_owner(member, owner);
                self.owners.insert(member, owner);
                self.members.entry(owner).or_default().insert(member);
            }
            None => {
                if let Some(previous) = self.owners.remove(&member) {
                    if let Some(members) = self.members.get_mut(&previous) {
                        members.remove(&member);
                    }
                }
            }
        }
    }

    fn detach_from_previous_owner(&mut self, member: Handle<M>, new_owner: Handle<O>) {
        match self.owners.get(&member).copied() {
            Some(previous) if previous != new_owner => {
                if let Some(members) = self.members.get_mut(&previous) {
                    members.remove(&member);
                }
            }
            _ => {}
        }
    }
}

/**
 * Symmetric one-to-one relationship between entities of the same type.
 */
pub struct Pairing<T> {
    partners: HashMap<Handle<T>, Handle<T>>,
}

impl<T> Default for Pairing<T> {
    fn default() -> Self {
        Pairing { partners: HashMap::new() }
    }
}

impl<T> Pairing<T> {
    /**
     * Partner of `entity`.
     */
    pub fn partner(&self, entity: Handle<T>) -> Option<Handle<T>> {
        self.partners.get(&entity).copied()
    }

    /**
     * Pairs `entity` with `other`, or unpairs it when `other` is `None`.
     *
     * The previous partners of both sides lose their reciprocal link. Only the immediate pair is
     * touched, so the update always terminates after one hop.
     */
    pub fn set_pair(&mut self, entity: Handle<T>, other: Option<Handle<T>>) {
        self.unlink(entity);
        if let Some(other) = other {
            self.unlink(other);
            self.partners.insert(other, entity);
            self.partners.insert(entity, other);
        }
    }

    fn unlink(&mut self, entity: Handle<T>) {
        if let Some(previous) = self.partners.remove(&entity) {
            if self.partners.get(&previous) == Some(&entity) {
                self.partners.remove(&previous);
            }
        }
    }
}

/**
 * Many-to-many relationship kept as two independent collections.
 *
 * The left side declares the join collection. The collections stay consistent only when
 * changed through `add`, `remove` and `set_right_of`.
 */
pub struct Association<L, R> {
    left_to_right: HashMap<Handle<L>, BTreeSet<Handle<R>>>,
    right_to_left: HashMap<Handle<R>, BTreeSet<Handle<L>>>,
}

impl<L, R> Default for Association<L, R> {
    fn default() -> Self {
        Association { left_to_right: HashMap::new(), right_to_left: HashMap::new() }
    }
}

impl<L, R> Association<L, R> {
    /**
     * Right side entities in the collection of `left`.
     */
    pub fn right_of(&self, left: Handle<L>) -> Vec<Handle<R>> {
        self.left_to_right.get(&left).map(|set| set.iter().copied().collect()).unwrap_or_default()
    }

    /**
     * Left side entities in the collection of `right`.
     */
    pub fn left_of(&self, right: Handle<R>) -> Vec<Handle<L>> {
        self.right_to_left.get(&right).map(|set| set.iter().copied().collect()).unwrap_or_default()
    }

    /**
     * Inserts the pair into both collections.
     */
    pub fn add(&mut self, left: Handle<L>, right: Handle<R>) {
        self.left_to_right.entry(left).or_default().insert(right);
        self.right_to_left.entry(right).or_default().insert(left);
    }

    /**
     * Removes the pair from both collections.
     */
    pub fn remove(&mut self, left: Handle<L>, right: Handle<R>) {
        if let Some(set) = self.left_to_right.get_mut(&left) {
            set.remove(&right);
        }
        if let Some(set) = self.right_to_left.get_mut(&right) {
            set.remove(&left);
        }
    }

    /**
     * Replaces the collection of `left` only. The right side collections are not rewritten.
     */
    pub fn set_left_collection(&mut self, left: Handle<L>, rights: impl IntoIterator<Item = Handle<R>>) {
        self.left_to_right.insert(left, rights.into_iter().collect());
    }

    /**
     * Replaces the collection of `right`, removing it from every previous left entity and adding
     * it to every new one.
     */
    pub fn set_right_of(&mut self, right: Handle<R>, lefts: impl IntoIterator<Item = Handle<L>>) {
        for left in self.left_of(right) {
            self.remove(left, right);
        }
        for left in lefts {
            self.add(left, right);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Owner;
    struct Member;

    fn owner(index: usize) -> Handle<Owner> {
        Handle::new(index)
    }

    fn member(index: usize) -> Handle<Member> {
        Handle::new(index)
    }

    #[test]
    fn test_set_members_clears_removed_members() {
        let mut ownership: Ownership<Owner, Member> = Ownership::default();
        ownership.set_members(owner(0), [member(0), member(1)]);
        ownership.set_members(owner(0), [member(1), member(2)]);
        assert_eq!(ownership.owner(member(0)), None);
        assert_eq!(ownership.owner(member(1)), Some(owner(0)));
        assert_eq!(ownership.owner(member(2)), Some(owner(0)));
        assert_eq!(ownership.members(owner(0)), vec![member(1), member(2)]);
    }

    #[test]
    fn test_set_members_to_itself_keeps_back_references() {
        let mut ownership: Ownership<Owner, Member> = Ownership::default();
        ownership.set_members(owner(0), [member(0), member(1)]);
        let same = ownership.members(owner(0));
        ownership.set_members(owner(0), same);
        assert_eq!(ownership.owner(member(0)), Some(owner(0)));
        assert_eq!(ownership.owner(member(1)), Some(owner(0)));
    }

    #[test]
    fn test_set_members_moves_member_between_owners() {
        let mut ownership: Ownership<Owner, Member> = Ownership::default();
        ownership.set_members(owner(0), [member(0), member(1)]);
        ownership.set_members(owner(1), [member(1)]);
        assert_eq!(ownership.owner(member(1)), Some(owner(1)));
        assert_eq!(ownership.members(owner(0)), vec![member(0)]);
        assert_eq!(ownership.members(owner(1)), vec![member(1)]);
    }

    #[test]
    fn test_add_and_remove_member() {
        let mut ownership: Ownership<Owner, Member> = Ownership::default();
        ownership.add_member(owner(0), member(3));
        assert_eq!(ownership.owner(member(3)), Some(owner(0)));
        ownership.remove_member(owner(1), member(3));
        assert_eq!(ownership.owner(member(3)), Some(owner(0)));
        ownership.remove_member(owner(0), member(3));
        assert_eq!(ownership.owner(member(3)), None);
        assert!(ownership.members(owner(0)).is_empty());
    }

    #[test]
    fn test_pairing_is_symmetric() {
        let mut pairing: Pairing<Member> = Pairing::default();
        pairing.set_pair(member(0), Some(member(1)));
        assert_eq!(pairing.partner(member(0)), Some(member(1)));
        assert_eq!(pairing.partner(member(1)), Some(member(0)));
    }

    #[test]
    fn test_repairing_clears_previous_partner() {
        let mut pairing: Pairing<Member> = Pairing::default();
        pairing.set_pair(member(0), Some(member(1)));
        pairing.set_pair(member(0), Some(member(2)));
        assert_eq!(pairing.partner(member(1)), None);
        assert_eq!(pairing.partner(member(0)), Some(member(2)));
        assert_eq!(pairing.partner(member(2)), Some(member(0)));
    }

    #[test]
    fn test_pairing_with_taken_partner_clears_its_old_link() {
        let mut pairing: Pairing<Member> = Pairing::default();
        pairing.set_pair(member(0), Some(member(1)));
        pairing.set_pair(member(2), Some(member(1)));
        assert_eq!(pairing.partner(member(0)), None);
        assert_eq!(pairing.partner(member(1)), Some(member(2)));
        pairing.set_pair(member(2), None);
        assert_eq!(pairing.partner(member(1)), None);
        assert_eq!(pairing.partner(member(2)), None);
    }

    #[test]
    fn test_association_add_remove_both_sides() {
        let mut association: Association<Owner, Member> = Association::default();
        association.add(owner(0), member(0));
        association.add(owner(1), member(0));
        assert_eq!(association.left_of(member(0)), vec![owner(0), owner(1)]);
        association.remove(owner(0), member(0));
        assert_eq!(association.left_of(member(0)), vec![owner(1)]);
        assert!(association.right_of(owner(0)).is_empty());
    }

    #[test]
    fn test_set_left_collection_does_not_touch_inverse_side() {
        let mut association: Association<Owner, Member> = Association::default();
        association.add(owner(0), member(0));
        association.set_left_collection(owner(0), [member(1)]);
        assert_eq!(association.right_of(owner(0)), vec![member(1)]);
        assert_eq!(association.left_of(member(0)), vec![owner(0)]);
        assert!(association.left_of(member(1)).is_empty());
    }

    #[test]
    fn test_set_right_of_is_symmetric() {
        let mut association: Association<Owner, Member> = Association::default();
        association.add(owner(0), member(0));
        association.set_right_of(member(0), [owner(1)]);
        assert!(association.right_of(owner(0)).is_empty());
        assert_eq!(association.right_of(owner(1)), vec![member(0)]);
        assert_eq!(association.left_of(member(0)), vec![owner(1)]);
    }
}
