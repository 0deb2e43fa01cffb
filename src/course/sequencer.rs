use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::entity::{CourseSlide, SlideKind};

/// Derived navigability of a single slide. Never stored; recomputed from the
/// completion set on every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlideAccess {
    /// Order < 1, always accessible.
    Intro,
    /// Already in the completion set.
    Visited,
    /// The slide currently being viewed.
    Current,
    /// The single lowest incomplete order >= 1.
    Frontier,
    /// Exam slide with its gate satisfied.
    ExamReady,
    /// Privileged capability bypass.
    Override,
    Locked,
}

impl SlideAccess {
    pub fn navigable(self) -> bool {
        !matches!(self, Self::Locked)
    }
}

/// The ordered slide list of one course, plus the gating rules over it.
#[derive(Debug, Clone)]
pub struct CourseOutline {
    slides: Vec<CourseSlide>,
}

impl CourseOutline {
    pub fn new(mut slides: Vec<CourseSlide>) -> Self {
        slides.sort_by_key(|s| s.order());
        Self { slides }
    }

    pub fn slides(&self) -> &[CourseSlide] {
        &self.slides
    }

    pub fn slide(&self, order: i32) -> Option<&CourseSlide> {
        self.slides.iter().find(|s| s.order() == order)
    }

    pub fn exam_slide(&self) -> Option<&CourseSlide> {
        self.slides.iter().find(|s| s.kind() == SlideKind::Exam)
    }

    pub fn exam_order(&self) -> Option<i32> {
        self.exam_slide().map(|s| s.order())
    }

    /// Number of gated curriculum slides: everything with order >= 1 except
    /// the exam slide itself.
    pub fn total_content_slides(&self) -> u32 {
        self.slides
            .iter()
            .filter(|s| s.order() >= 1 && s.kind() != SlideKind::Exam)
            .count() as u32
    }

    /// The exam unlocks only once every order in `[1, total_content_slides]`
    /// is completed. Orders outside the range never count.
    pub fn exam_unlocked(&self, completed: &BTreeSet<i32>) -> bool {
        let total = self.total_content_slides() as i32;
        (1..=total).all(|order| completed.contains(&order))
    }

    /// Lowest incomplete order >= 1, skipping the exam slide. `None` once the
    /// curriculum is fully completed.
    pub fn frontier_order(&self, completed: &BTreeSet<i32>) -> Option<i32> {
        self.slides
            .iter()
            .filter(|s| s.order() >= 1 && s.kind() != SlideKind::Exam)
            .map(|s| s.order())
            .find(|order| !completed.contains(order))
    }

    /// The next slide the learner may advance into. Falls through to the exam
    /// slide when nothing else remains.
    pub fn next_available(&self, completed: &BTreeSet<i32>) -> Option<i32> {
        self.frontier_order(completed).or_else(|| self.exam_order())
    }

    /// Access state for one slide. `has_override` is the explicit privileged
    /// capability; it is decided by the caller, not looked up here.
    ///
    /// `current` is a client-reported display hint ("this slide is on
    /// screen"). It relabels a slide the learner may already open; it never
    /// unlocks one, so a fabricated claim cannot skip past the frontier.
    pub fn access(
        &self,
        order: i32,
        current: Option<i32>,
        completed: &BTreeSet<i32>,
        has_override: bool,
    ) -> SlideAccess {
        if has_override {
            return SlideAccess::Override;
        }
        if order < 1 {
            return SlideAccess::Intro;
        }

        // The exam gate layers over everything else: the exam slide is never
        // the generic frontier and stays locked until the whole range is done.
        if self.exam_order() == Some(order) {
            return if self.exam_unlocked(completed) {
                SlideAccess::ExamReady
            } else {
                SlideAccess::Locked
            };
        }

        if completed.contains(&order) {
            return if current == Some(order) {
                SlideAccess::Current
            } else {
                SlideAccess::Visited
            };
        }
        if self.frontier_order(completed) == Some(order) {
            return if current == Some(order) {
                SlideAccess::Current
            } else {
                SlideAccess::Frontier
            };
        }

        SlideAccess::Locked
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::entity::SlideKind;
    use uuid::Uuid;

    fn slide(order: i32, kind: SlideKind) -> CourseSlide {
        CourseSlide::new(
            Uuid::new_v4(),
            Uuid::nil(),
            order,
            kind,
            format!("slide {order}"),
            None,
            None,
            None,
            None,
        )
    }

    /// 2 intro slides, content 1..=n, exam after.
    fn outline(content_count: i32) -> CourseOutline {
        let mut slides = vec![slide(-1, SlideKind::Content), slide(0, SlideKind::Attention)];
        for order in 1..=content_count {
            slides.push(slide(order, SlideKind::Content));
        }
        slides.push(slide(content_count + 1, SlideKind::Exam));
        CourseOutline::new(slides)
    }

    fn completed(orders: &[i32]) -> BTreeSet<i32> {
        orders.iter().copied().collect()
    }

    #[test]
    fn frontier_is_lowest_missing_order() {
        let outline = outline(5);
        let done = completed(&[1, 2, 4]);
        assert_eq!(outline.frontier_order(&done), Some(3));
        assert_eq!(outline.next_available(&done), Some(3));
    }

    #[test]
    fn empty_progress_unlocks_only_slide_one() {
        let outline = outline(5);
        let done = completed(&[]);
        assert_eq!(outline.access(1, None, &done, false), SlideAccess::Frontier);
        for order in 2..=5 {
            assert_eq!(outline.access(order, None, &done, false), SlideAccess::Locked);
        }
        assert_eq!(outline.access(-1, None, &done, false), SlideAccess::Intro);
        assert_eq!(outline.access(0, None, &done, false), SlideAccess::Intro);
    }

    #[test]
    fn current_relabels_visited_and_frontier_slides() {
        let outline = outline(5);
        let done = completed(&[1, 2]);
        assert_eq!(outline.access(2, Some(2), &done, false), SlideAccess::Current);
        assert_eq!(outline.access(3, Some(3), &done, false), SlideAccess::Current);
        // without the on-screen claim the underlying states show through
        assert_eq!(outline.access(2, None, &done, false), SlideAccess::Visited);
        assert_eq!(outline.access(3, None, &done, false), SlideAccess::Frontier);
    }

    #[test]
    fn current_claim_never_unlocks_a_slide() {
        let outline = outline(5);
        let done = completed(&[1, 2]);
        // slide 4 is past the frontier; claiming it is on screen changes nothing
        assert_eq!(outline.access(4, Some(4), &done, false), SlideAccess::Locked);
        assert_eq!(outline.access(4, Some(3), &done, false), SlideAccess::Locked);

        // a fresh learner claiming any slide still only gets slide 1
        let none = completed(&[]);
        for order in 2..=5 {
            assert!(!outline.access(order, Some(order), &none, false).navigable());
        }
        assert_eq!(outline.access(1, Some(1), &none, false), SlideAccess::Current);
    }

    #[test]
    fn exam_gate_requires_full_range() {
        let outline = outline(46);
        let exam_order = outline.exam_order().unwrap();

        let mut done: BTreeSet<i32> = (1..=46).collect();
        assert_eq!(
            outline.access(exam_order, None, &done, false),
            SlideAccess::ExamReady
        );

        done.remove(&17);
        assert_eq!(
            outline.access(exam_order, None, &done, false),
            SlideAccess::Locked
        );

        // orders outside [1, 46] never count toward the gate
        done.insert(-1);
        done.insert(99);
        assert_eq!(
            outline.access(exam_order, None, &done, false),
            SlideAccess::Locked
        );
    }

    #[test]
    fn exam_is_never_the_generic_frontier() {
        let outline = outline(3);
        let done = completed(&[1, 2, 3]);
        assert_eq!(outline.frontier_order(&done), None);
        assert_eq!(outline.next_available(&done), outline.exam_order());
    }

    #[test]
    fn override_bypasses_every_lock() {
        let outline = outline(5);
        let done = completed(&[]);
        for order in 1..=6 {
            assert!(outline.access(order, None, &done, true).navigable());
        }
    }

    #[test]
    fn total_content_excludes_intro_and_exam() {
        let outline = outline(5);
        assert_eq!(outline.total_content_slides(), 5);
    }
}
