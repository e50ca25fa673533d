/// Array-backed binary heap ordered by a caller-supplied predicate.
///
/// `should_sort_before(a, b)` returns true when `a` must be popped before
/// `b`. The root is always an element no other element sorts before.
///
/// # Examples
/// ```
/// use pathsynth::executor::priority_heap::PriorityHeap;
///
/// let mut heap = PriorityHeap::new(|a: &i32, b: &i32| a > b);
/// for x in [3, 9, 1, 7] {
///     heap.insert(x);
/// }
/// assert_eq!(heap.peek(), Some(&9));
/// assert_eq!(heap.pop(), Some(9));
/// assert_eq!(heap.pop(), Some(7));
/// assert_eq!(heap.count(), 2);
/// ```
pub struct PriorityHeap<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    items: Vec<T>,
    should_sort_before: F,
}

impl<T, F> PriorityHeap<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    pub fn new(should_sort_before: F) -> Self {
        PriorityHeap {
            items: Vec::new(),
            should_sort_before,
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn insert(&mut self, item: T) {
        self.items.push(item);
        let last = self.items.len() - 1;
        self.shift_up(last);
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            None
        } else {
            self.remove_at(0)
        }
    }

    /// Removes the element at `index` of the backing array.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.swap_remove(index);
        if index < self.items.len() {
            self.shift_down(index);
            self.shift_up(index);
        }
        Some(item)
    }

    /// Empties the heap, yielding elements in backing-array order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.items.drain(..)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    fn sorts_before(&self, a: usize, b: usize) -> bool {
        (self.should_sort_before)(&self.items[a], &self.items[b])
    }

    fn shift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.sorts_before(index, parent) {
                break;
            }
            self.items.swap(index, parent);
            index = parent;
        }
    }

    fn shift_down(&mut self, mut index: usize) {
        let n = self.items.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut first = index;
            if left < n && self.sorts_before(left, first) {
                first = left;
            }
            if right < n && self.sorts_before(right, first) {
                first = right;
            }
            if first == index {
                break;
            }
            self.items.swap(index, first);
            index = first;
        }
    }
}
